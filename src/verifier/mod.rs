pub mod classify;
pub mod runner;

pub use classify::classify;
pub use runner::Verifier;
