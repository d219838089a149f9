pub mod commands;
pub mod list;
pub mod query;
pub mod serve;
pub mod verify;

pub use commands::{Cli, Commands};
