use serde::{Deserialize, Serialize};

/// A dependency alert scheduled for runtime verification. Supplied as static
/// configuration (built-in catalog or YAML file) and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityRecord {
    /// CVE identifier, e.g. "CVE-2024-21508".
    pub cve: String,
    /// Affected package as named by the alert (npm/go/pip coordinates).
    pub package: String,
    /// Service that owns the dependency; used for the container presence check.
    pub service: String,
    /// Dependabot alert number to dismiss when the finding is not confirmed.
    pub alert_id: u64,
    /// First version that remediates the vulnerability.
    pub fixed_version: String,
}
