//! DQL query construction. Queries are opaque strings to the rest of the
//! crate; everything here is deterministic and performs no I/O.

/// Query for running container-group instances whose image name contains
/// every slash-delimited segment of `<prefix>/<service>`. An instance must
/// match all segments, not just one.
pub fn container_presence_query(image_prefix: &str, service: &str) -> String {
    format!(
        r#"fetch dt.entity.container_group_instance
| fieldsAdd containerImageName, matchingOptions=splitString("{prefix}/{service}", "/")
| fieldsAdd collectedArray=iCollectArray(contains(containerImageName,matchingOptions[]))
| filterOut in(false,collectedArray)
| fieldsAdd entity.name, entity.type"#,
        prefix = image_prefix,
        service = service,
    )
}

/// Query for open, non-muted vulnerability state reports referencing `cve`,
/// deduplicated to the most recent report per (vulnerability, entity) pair.
pub fn security_events_query(cve: &str) -> String {
    format!(
        r#"fetch security.events
| filter dt.system.bucket=="default_securityevents_builtin"
     AND event.provider=="Dynatrace"
     AND event.type=="VULNERABILITY_STATE_REPORT_EVENT"
     AND event.level=="ENTITY"
| dedup {{vulnerability.display_id, affected_entity.id}}, sort:{{timestamp desc}}
| filter in("{cve}", vulnerability.references.cve)
| filter vulnerability.resolution.status == "OPEN"
     AND vulnerability.parent.mute.status != "MUTED"
     AND vulnerability.mute.status != "MUTED"
| fieldsAdd vulnerability.davis_assessment.vulnerable_function_status,
             vulnerability.davis_assessment.exploit_status,
             vulnerability.davis_assessment.exposure_status,
             vulnerability.davis_assessment.data_assets_status,
             vulnerability.risk.score,
             vulnerability.risk.level,
             affected_entity.name,
             affected_entity.id"#,
        cve = cve,
    )
}

/// Filters for the environment-wide vulnerability report query.
#[derive(Debug, Clone)]
pub struct ReportQueryOptions {
    /// Lookback window in days.
    pub days: u32,
    /// Restrict to these severities (CRITICAL, HIGH, MEDIUM, LOW).
    pub severities: Vec<String>,
    /// Only vulnerabilities whose function is observed in use.
    pub function_in_use: bool,
    /// Restrict to a single CVE.
    pub cve: Option<String>,
    /// Restrict to a single affected entity.
    pub entity_id: Option<String>,
}

impl Default for ReportQueryOptions {
    fn default() -> Self {
        Self {
            days: 7,
            severities: Vec::new(),
            function_in_use: false,
            cve: None,
            entity_id: None,
        }
    }
}

/// Query for the environment-wide open-vulnerability report, sorted by risk.
pub fn vulnerability_report_query(opts: &ReportQueryOptions) -> String {
    let mut query = format!(
        r#"fetch security.events, from:now() - {days}d
| filter event.type == "VULNERABILITY_STATE_REPORT_EVENT"
| dedup {{vulnerability.display_id, affected_entity.id}}, sort: {{timestamp desc}}
| filter vulnerability.resolution_status == "OPEN"
"#,
        days = opts.days,
    );

    if !opts.severities.is_empty() {
        let list = opts.severities.join("\", \"");
        query.push_str(&format!(
            "| filter vulnerability.severity in [\"{}\"]\n",
            list
        ));
    }

    if opts.function_in_use {
        query.push_str("| filter davis.assessment.vulnerable_function_in_use == true\n");
    }

    if let Some(entity_id) = &opts.entity_id {
        query.push_str(&format!("| filter affected_entity.id == \"{}\"\n", entity_id));
    }

    if let Some(cve) = &opts.cve {
        // CVE references are an array and need expanding before equality.
        query.push_str("| expand vulnerability.references.cve\n");
        query.push_str(&format!(
            "| filter vulnerability.references.cve == \"{}\"\n",
            cve
        ));
    }

    query.push_str(
        r#"| fieldsAdd
    vuln_id = vulnerability.display_id,
    vuln_title = vulnerability.title,
    severity = vulnerability.severity,
    cvss_score = vulnerability.cvss_score,
    davis_risk_level = davis.assessment.risk_level,
    davis_risk_score = davis.assessment.risk_score,
    function_in_use = davis.assessment.vulnerable_function_in_use,
    public_exploit = davis.assessment.public_exploit_available,
    reachable_data = davis.assessment.reachable_data_asset,
    technology = vulnerability.technology,
    vulnerable_component = vulnerability.vulnerable_component,
    cve_ids = vulnerability.references.cve,
    entity_name = entityName(affected_entity.id),
    entity_type = affected_entity.type,
    entity_id = affected_entity.id,
    resolution_status = vulnerability.resolution_status,
    muted = vulnerability.muted,
    first_seen = vulnerability.first_seen_timestamp,
    last_updated = timestamp
| fields
    vuln_id, vuln_title, severity, cvss_score,
    davis_risk_level, davis_risk_score, function_in_use, public_exploit, reachable_data,
    technology, vulnerable_component, cve_ids,
    entity_name, entity_type, entity_id,
    resolution_status, muted, first_seen, last_updated
| sort davis_risk_score desc, cvss_score desc"#,
    );

    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_query_embeds_full_image_path() {
        let query = container_presence_query("appsec-ai-initiative-dev/unguard/src", "status-service");
        assert!(query.contains("fetch dt.entity.container_group_instance"));
        assert!(query.contains("appsec-ai-initiative-dev/unguard/src/status-service"));
        assert!(query.contains("filterOut in(false,collectedArray)"));
    }

    #[test]
    fn test_security_events_query_filters() {
        let query = security_events_query("CVE-2024-21508");
        assert!(query.contains(r#"in("CVE-2024-21508", vulnerability.references.cve)"#));
        assert!(query.contains(r#"vulnerability.resolution.status == "OPEN""#));
        assert!(query.contains(r#"vulnerability.mute.status != "MUTED""#));
        assert!(query.contains("vulnerability.davis_assessment.vulnerable_function_status"));
    }

    #[test]
    fn test_distinct_cves_produce_distinct_queries() {
        let a = security_events_query("CVE-2024-21508");
        let b = security_events_query("CVE-2021-44906");
        assert_ne!(a, b);
        assert!(a.contains("CVE-2024-21508"));
        assert!(!a.contains("CVE-2021-44906"));
        assert!(b.contains("CVE-2021-44906"));
        assert!(!b.contains("CVE-2024-21508"));
    }

    #[test]
    fn test_query_construction_is_deterministic() {
        let opts = ReportQueryOptions::default();
        assert_eq!(vulnerability_report_query(&opts), vulnerability_report_query(&opts));
        assert_eq!(
            security_events_query("CVE-2023-41419"),
            security_events_query("CVE-2023-41419")
        );
    }

    #[test]
    fn test_report_query_default_has_no_optional_filters() {
        let query = vulnerability_report_query(&ReportQueryOptions::default());
        assert!(query.contains("from:now() - 7d"));
        assert!(!query.contains("vulnerability.severity in"));
        assert!(!query.contains("vulnerable_function_in_use == true"));
        assert!(!query.contains("expand vulnerability.references.cve"));
    }

    #[test]
    fn test_report_query_with_all_filters() {
        let opts = ReportQueryOptions {
            days: 30,
            severities: vec!["CRITICAL".into(), "HIGH".into()],
            function_in_use: true,
            cve: Some("CVE-2025-29927".into()),
            entity_id: Some("PROCESS_GROUP-42".into()),
        };
        let query = vulnerability_report_query(&opts);
        assert!(query.contains("from:now() - 30d"));
        assert!(query.contains(r#"vulnerability.severity in ["CRITICAL", "HIGH"]"#));
        assert!(query.contains("vulnerable_function_in_use == true"));
        assert!(query.contains("expand vulnerability.references.cve"));
        assert!(query.contains(r#"vulnerability.references.cve == "CVE-2025-29927""#));
        assert!(query.contains(r#"affected_entity.id == "PROCESS_GROUP-42""#));
    }
}
