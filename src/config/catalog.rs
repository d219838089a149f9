use std::path::Path;

use regex::Regex;
use tracing::info;

use crate::errors::VerifyError;
use crate::models::VulnerabilityRecord;

/// The built-in verification catalog. These are the open Dependabot alerts
/// tracked against the monitored environment.
pub fn builtin_catalog() -> Vec<VulnerabilityRecord> {
    let entries = [
        ("CVE-2023-41419", "gevent", "malicious-load-generator", 44, "23.9.0"),
        ("CVE-2022-40083", "github.com/labstack/echo/v4", "status-service", 86, "4.9.0"),
        ("CVE-2024-45337", "golang.org/x/crypto", "status-service", 102, "0.31.0"),
        ("CVE-2021-44906", "minimist", "user-auth-service", 129, "1.2.6"),
        ("CVE-2024-21511", "mysql2", "user-auth-service", 138, "3.9.7"),
        ("CVE-2024-21508", "mysql2", "user-auth-service", 137, "3.9.4"),
        ("CVE-2025-29927", "next", "frontend-nextjs", 11, "15.2.3"),
    ];

    entries
        .iter()
        .map(|(cve, package, service, alert_id, fixed_version)| VulnerabilityRecord {
            cve: cve.to_string(),
            package: package.to_string(),
            service: service.to_string(),
            alert_id: *alert_id,
            fixed_version: fixed_version.to_string(),
        })
        .collect()
}

/// Load a verification catalog from a YAML file: a top-level list of records
/// with the same fields as [`VulnerabilityRecord`].
pub async fn load_catalog(path: &Path) -> Result<Vec<VulnerabilityRecord>, VerifyError> {
    if !path.exists() {
        return Err(VerifyError::Catalog(format!(
            "Catalog file not found: {}",
            path.display()
        )));
    }

    let content = tokio::fs::read_to_string(path).await?;
    let records: Vec<VulnerabilityRecord> = serde_yaml::from_str(&content)?;
    validate_catalog(&records)?;

    info!(count = records.len(), path = %path.display(), "Loaded vulnerability catalog");
    Ok(records)
}

/// Reject malformed entries before any query is built from them.
pub fn validate_catalog(records: &[VulnerabilityRecord]) -> Result<(), VerifyError> {
    if records.is_empty() {
        return Err(VerifyError::Catalog("Catalog contains no entries".into()));
    }

    let cve_pattern = Regex::new(r"^CVE-\d{4}-\d{4,}$").map_err(|e| {
        VerifyError::Internal(format!("CVE pattern failed to compile: {}", e))
    })?;

    for record in records {
        if !cve_pattern.is_match(&record.cve) {
            return Err(VerifyError::Catalog(format!(
                "Invalid CVE identifier: {}",
                record.cve
            )));
        }
        if record.package.trim().is_empty() || record.service.trim().is_empty() {
            return Err(VerifyError::Catalog(format!(
                "Entry {} is missing a package or service name",
                record.cve
            )));
        }
        if record.alert_id == 0 {
            return Err(VerifyError::Catalog(format!(
                "Entry {} has an invalid alert id",
                record.cve
            )));
        }
    }

    Ok(())
}
