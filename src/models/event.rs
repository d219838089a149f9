use serde::{Deserialize, Deserializer, Serialize};

/// Whether the runtime has observed the vulnerable function being executed,
/// as opposed to the library merely being present on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FunctionUsage {
    InUse,
    NotInUse,
    Unknown,
}

impl Default for FunctionUsage {
    fn default() -> Self {
        FunctionUsage::Unknown
    }
}

impl FunctionUsage {
    /// Map the backend's status string. Anything unrecognized (including a
    /// missing field) is treated as Unknown, never as NotInUse.
    pub fn from_status(status: Option<&str>) -> Self {
        match status {
            Some("IN_USE") => FunctionUsage::InUse,
            Some("NOT_IN_USE") => FunctionUsage::NotInUse,
            _ => FunctionUsage::Unknown,
        }
    }
}

fn usage_or_unknown<'de, D>(deserializer: D) -> Result<FunctionUsage, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(FunctionUsage::from_status(raw.as_deref()))
}

/// One deduplicated vulnerability state report from the security-event query.
/// Field names mirror the DQL projection, which uses dotted identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    #[serde(
        rename = "vulnerability.davis_assessment.vulnerable_function_status",
        default,
        deserialize_with = "usage_or_unknown"
    )]
    pub vulnerable_function: FunctionUsage,

    #[serde(rename = "vulnerability.davis_assessment.exploit_status", default)]
    pub exploit_status: Option<String>,

    #[serde(rename = "vulnerability.davis_assessment.exposure_status", default)]
    pub exposure_status: Option<String>,

    #[serde(rename = "vulnerability.davis_assessment.data_assets_status", default)]
    pub data_assets_status: Option<String>,

    #[serde(rename = "vulnerability.risk.score", default)]
    pub risk_score: Option<f64>,

    #[serde(rename = "vulnerability.risk.level", default)]
    pub risk_level: Option<String>,

    #[serde(rename = "affected_entity.name", default)]
    pub entity_name: Option<String>,

    #[serde(rename = "affected_entity.id", default)]
    pub entity_id: Option<String>,
}

/// Outcome of the security-event query for one CVE.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityEventFinding {
    pub found: bool,
    pub events: Vec<SecurityEvent>,
}

impl SecurityEventFinding {
    pub fn from_events(events: Vec<SecurityEvent>) -> Self {
        Self { found: !events.is_empty(), events }
    }

    /// True when at least one event reports the vulnerable function as IN_USE.
    pub fn any_function_in_use(&self) -> bool {
        self.events
            .iter()
            .any(|e| e.vulnerable_function == FunctionUsage::InUse)
    }
}
