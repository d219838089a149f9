pub mod formatter;
pub mod summary;

pub use formatter::{format_verification_report, format_vulnerability_listing, ListFormat};
pub use summary::print_run_summary;
