use serde::{Deserialize, Serialize};

use super::event::SecurityEvent;

/// Final verdict for one vulnerability record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    Confirmed,
    #[serde(rename = "Not-confirmed")]
    NotConfirmed,
}

/// Everything known about one record after a verification pass. The ordered
/// list of these is what gets persisted to the results file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub cve: String,
    pub package: String,
    pub service: String,
    pub alert_id: u64,
    pub fixed_version: String,
    pub status: Classification,
    pub reason: String,
    pub containers_found: usize,
    pub security_events_found: bool,
    pub security_events_count: usize,
    pub security_events_details: Vec<SecurityEvent>,
}

/// Aggregate totals for one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub confirmed: usize,
    pub not_confirmed: usize,
    pub dismissed: usize,
    pub dismiss_failures: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_serde_labels() {
        assert_eq!(
            serde_json::to_string(&Classification::Confirmed).unwrap(),
            "\"Confirmed\""
        );
        assert_eq!(
            serde_json::to_string(&Classification::NotConfirmed).unwrap(),
            "\"Not-confirmed\""
        );

        let parsed: Classification = serde_json::from_str("\"Not-confirmed\"").unwrap();
        assert_eq!(parsed, Classification::NotConfirmed);
    }
}
