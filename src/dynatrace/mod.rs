pub mod client;
pub mod dql;

pub use client::{DynatraceClient, QueryOutcome, SecurityBackend};
pub use dql::{container_presence_query, security_events_query, vulnerability_report_query, ReportQueryOptions};
