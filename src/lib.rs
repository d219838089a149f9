pub mod cli;
pub mod config;
pub mod dynatrace;
pub mod errors;
pub mod github;
pub mod models;
pub mod relay;
pub mod reporting;
pub mod verifier;
