pub mod event;
pub mod outcome;
pub mod record;

pub use event::{FunctionUsage, SecurityEvent, SecurityEventFinding};
pub use outcome::{Classification, RunSummary, VerificationResult};
pub use record::VulnerabilityRecord;
