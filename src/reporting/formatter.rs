use serde_json::Value;

use crate::errors::VerifyError;
use crate::models::VerificationResult;

/// Render the two-section verification report posted to the tracking issue.
pub fn format_verification_report(
    confirmed: &[&VerificationResult],
    not_confirmed: &[&VerificationResult],
) -> String {
    let mut parts = vec!["## Dynatrace Vulnerability Verification Results\n".to_string()];

    if !confirmed.is_empty() {
        parts.push("### ✅ Confirmed Vulnerabilities (need fixing):\n".to_string());
        for result in confirmed {
            parts.push(format!(
                "- **{}** ({}) in {}",
                result.cve, result.package, result.service
            ));
            parts.push("  - Status: Confirmed".to_string());
            parts.push(format!("  - Reason: {}", result.reason));
            parts.push(format!("  - Fix available: {}\n", result.fixed_version));
        }
    }

    if !not_confirmed.is_empty() {
        parts.push("### ❌ Not-Confirmed Vulnerabilities (will be dismissed):\n".to_string());
        for result in not_confirmed {
            parts.push(format!(
                "- **{}** ({}) in {}",
                result.cve, result.package, result.service
            ));
            parts.push("  - Status: Not-confirmed".to_string());
            parts.push(format!("  - Reason: {}\n", result.reason));
        }
    }

    parts.join("\n")
}

/// Output rendering for the environment-wide vulnerability listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFormat {
    Json,
    Csv,
    Markdown,
}

impl ListFormat {
    pub fn parse(s: &str) -> Result<Self, VerifyError> {
        match s {
            "json" => Ok(ListFormat::Json),
            "csv" => Ok(ListFormat::Csv),
            "markdown" => Ok(ListFormat::Markdown),
            other => Err(VerifyError::Config(format!("Invalid output format: {}", other))),
        }
    }
}

/// Column order for tabular listing output, matching the report query's
/// projected field names.
const LIST_COLUMNS: &[&str] = &[
    "vuln_id",
    "vuln_title",
    "severity",
    "cvss_score",
    "davis_risk_level",
    "davis_risk_score",
    "function_in_use",
    "public_exploit",
    "reachable_data",
    "technology",
    "vulnerable_component",
    "entity_name",
    "entity_type",
    "resolution_status",
];

pub fn format_vulnerability_listing(
    records: &[Value],
    format: ListFormat,
) -> Result<String, VerifyError> {
    match format {
        ListFormat::Json => Ok(serde_json::to_string_pretty(records)?),
        ListFormat::Csv => Ok(format_csv(records)),
        ListFormat::Markdown => Ok(format_markdown(records)),
    }
}

fn cell(record: &Value, column: &str) -> String {
    match record.get(column) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn format_csv(records: &[Value]) -> String {
    let mut out = String::new();
    out.push_str(&LIST_COLUMNS.join(","));
    out.push('\n');

    for record in records {
        let row: Vec<String> = LIST_COLUMNS
            .iter()
            .map(|col| {
                let value = cell(record, col);
                if value.contains([',', '"', '\n', '\r']) {
                    format!("\"{}\"", value.replace('"', "\"\""))
                } else {
                    value
                }
            })
            .collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

fn format_markdown(records: &[Value]) -> String {
    if records.is_empty() {
        return "No open vulnerabilities found.\n".to_string();
    }

    let mut out = String::from("# Open Vulnerabilities\n\n");
    out.push_str("| CVE | Title | Severity | Risk | Function in use | Entity |\n");
    out.push_str("|---|---|---|---|---|---|\n");

    for record in records {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            cell(record, "vuln_id"),
            cell(record, "vuln_title"),
            cell(record, "severity"),
            cell(record, "davis_risk_level"),
            cell(record, "function_in_use"),
            cell(record, "entity_name"),
        ));
    }

    out
}
