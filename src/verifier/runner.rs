use std::path::Path;

use tracing::{error, info, warn};

use crate::config::Settings;
use crate::dynatrace::{container_presence_query, security_events_query, SecurityBackend};
use crate::errors::VerifyError;
use crate::github::{GithubClient, DISMISS_REASON_NOT_USED};
use crate::models::{
    Classification, RunSummary, SecurityEvent, SecurityEventFinding, VerificationResult,
    VulnerabilityRecord,
};
use crate::reporting::format_verification_report;

use super::classify::classify;

/// Runs the verification pass: one record at a time, two queries per record,
/// then reporting and dismissal side effects. Strictly sequential.
pub struct Verifier<'a> {
    backend: &'a dyn SecurityBackend,
    github: Option<&'a GithubClient>,
    settings: &'a Settings,
    /// When set, GitHub side effects are skipped; results are still written.
    dry_run: bool,
}

impl<'a> Verifier<'a> {
    pub fn new(
        backend: &'a dyn SecurityBackend,
        github: Option<&'a GithubClient>,
        settings: &'a Settings,
        dry_run: bool,
    ) -> Self {
        Self { backend, github, settings, dry_run }
    }

    /// Verify every catalog entry in input order, post the report, dismiss
    /// not-confirmed alerts, and persist the full result list. Side-effect
    /// failures are logged per item and never abort the pass.
    pub async fn run(
        &self,
        catalog: &[VulnerabilityRecord],
    ) -> Result<(Vec<VerificationResult>, RunSummary), VerifyError> {
        info!(
            environment = %self.settings.backend_environment,
            entries = catalog.len(),
            "Starting vulnerability verification"
        );

        let mut results = Vec::with_capacity(catalog.len());
        for record in catalog {
            results.push(self.verify_record(record).await);
        }

        let (confirmed, not_confirmed): (Vec<_>, Vec<_>) = results
            .iter()
            .partition(|r| r.status == Classification::Confirmed);

        info!(
            total = results.len(),
            confirmed = confirmed.len(),
            not_confirmed = not_confirmed.len(),
            "Verification pass complete"
        );

        let mut dismissed = 0;
        let mut dismiss_failures = 0;

        if self.dry_run {
            info!("Dry run: skipping issue comment and alert dismissal");
        } else if let Some(github) = self.github {
            let report = format_verification_report(&confirmed, &not_confirmed);
            if let Err(e) = github
                .post_issue_comment(self.settings.report_issue, &report)
                .await
            {
                error!(error = %e, "Failed to post verification report");
            }

            // Each dismissal is independent; one failure must not block the rest.
            for result in &not_confirmed {
                match github
                    .dismiss_alert(result.alert_id, DISMISS_REASON_NOT_USED, &result.reason)
                    .await
                {
                    Ok(()) => dismissed += 1,
                    Err(e) => {
                        dismiss_failures += 1;
                        error!(alert_id = result.alert_id, error = %e, "Failed to dismiss alert");
                    }
                }
            }
        } else {
            warn!("No GitHub token configured, skipping comment and dismissal");
        }

        self.write_results(&results, Path::new(&self.settings.results_path))
            .await?;

        let summary = RunSummary {
            total: results.len(),
            confirmed: confirmed.len(),
            not_confirmed: not_confirmed.len(),
            dismissed,
            dismiss_failures,
        };

        Ok((results, summary))
    }

    async fn verify_record(&self, record: &VulnerabilityRecord) -> VerificationResult {
        info!(cve = %record.cve, service = %record.service, "Verifying vulnerability");

        let containers_found = self.check_running_containers(&record.service).await;
        info!(service = %record.service, containers_found, "Container presence check");

        let finding = self.check_security_events(&record.cve).await;
        info!(cve = %record.cve, found = finding.found, events = finding.events.len(), "Security event check");

        let (status, reason) = classify(containers_found, &finding);

        VerificationResult {
            cve: record.cve.clone(),
            package: record.package.clone(),
            service: record.service.clone(),
            alert_id: record.alert_id,
            fixed_version: record.fixed_version.clone(),
            status,
            reason,
            containers_found,
            security_events_found: finding.found,
            security_events_count: finding.events.len(),
            security_events_details: finding.events,
        }
    }

    /// Count running container-group instances whose image matches the
    /// service's expected path. Query errors count as zero matches.
    async fn check_running_containers(&self, service: &str) -> usize {
        let query = container_presence_query(&self.settings.image_prefix, service);
        let outcome = self.backend.execute(&query).await;
        if outcome.is_error() {
            warn!(service, "Container presence query failed, treating as no match");
        }
        outcome.into_records().len()
    }

    /// Fetch open security events referencing the CVE. Query errors resolve
    /// to an empty finding; records that fail to parse are skipped.
    async fn check_security_events(&self, cve: &str) -> SecurityEventFinding {
        let query = security_events_query(cve);
        let outcome = self.backend.execute(&query).await;
        if outcome.is_error() {
            warn!(cve, "Security event query failed, treating as not found");
        }

        let events = outcome
            .into_records()
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<SecurityEvent>(record) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!(cve, error = %e, "Skipping unparseable security event record");
                    None
                }
            })
            .collect();

        SecurityEventFinding::from_events(events)
    }

    async fn write_results(
        &self,
        results: &[VerificationResult],
        path: &Path,
    ) -> Result<(), VerifyError> {
        let body = serde_json::to_string_pretty(results)?;
        tokio::fs::write(path, body).await?;
        info!(path = %path.display(), "Wrote verification results");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendAuth, Settings};
    use crate::dynatrace::QueryOutcome;
    use async_trait::async_trait;
    use serde_json::json;

    /// Backend scripted by query content: container queries answer with
    /// `containers` rows, event queries per CVE with the mapped rows.
    struct ScriptedBackend {
        containers: Vec<serde_json::Value>,
        events: Vec<(String, QueryOutcome)>,
    }

    #[async_trait]
    impl SecurityBackend for ScriptedBackend {
        async fn execute(&self, query: &str) -> QueryOutcome {
            if query.contains("dt.entity.container_group_instance") {
                if self.containers.is_empty() {
                    return QueryOutcome::Empty;
                }
                return QueryOutcome::Records(self.containers.clone());
            }
            for (cve, outcome) in &self.events {
                if query.contains(cve.as_str()) {
                    return outcome.clone();
                }
            }
            QueryOutcome::Empty
        }
    }

    fn test_settings(results_path: &Path) -> Settings {
        Settings {
            backend_base_url: "https://dt.example.com".into(),
            backend_environment: "test-env".into(),
            backend_auth: BackendAuth::ApiToken("token".into()),
            github_token: None,
            repo_owner: "owner".into(),
            repo_name: "repo".into(),
            report_issue: 1,
            image_prefix: "org/project/src".into(),
            results_path: results_path.to_string_lossy().into_owned(),
        }
    }

    fn record(cve: &str, service: &str, alert_id: u64) -> VulnerabilityRecord {
        VulnerabilityRecord {
            cve: cve.into(),
            package: "pkg".into(),
            service: service.into(),
            alert_id,
            fixed_version: "1.0.0".into(),
        }
    }

    fn in_use_event() -> serde_json::Value {
        json!({
            "vulnerability.davis_assessment.vulnerable_function_status": "IN_USE",
            "vulnerability.risk.score": 8.2,
            "affected_entity.name": "user-auth-service"
        })
    }

    #[tokio::test]
    async fn test_run_confirms_in_use_and_writes_results() {
        let dir = tempfile::tempdir().unwrap();
        let results_path = dir.path().join("results.json");
        let settings = test_settings(&results_path);

        let backend = ScriptedBackend {
            containers: vec![json!({"entity.name": "a"}), json!({"entity.name": "b"})],
            events: vec![(
                "CVE-2024-21508".into(),
                QueryOutcome::Records(vec![in_use_event()]),
            )],
        };

        let verifier = Verifier::new(&backend, None, &settings, false);
        let (results, summary) = verifier
            .run(&[record("CVE-2024-21508", "user-auth-service", 137)])
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, Classification::Confirmed);
        assert_eq!(results[0].containers_found, 2);
        assert!(results[0].security_events_found);
        assert_eq!(summary.confirmed, 1);
        assert_eq!(summary.not_confirmed, 0);

        // Results file holds the ordered list, overwritten each run.
        let persisted: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&results_path).unwrap()).unwrap();
        assert_eq!(persisted[0]["cve"], "CVE-2024-21508");
        assert_eq!(persisted[0]["status"], "Confirmed");
    }

    #[tokio::test]
    async fn test_run_not_confirmed_when_service_running_without_events() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_settings(&dir.path().join("results.json"));

        let backend = ScriptedBackend {
            containers: vec![json!({"entity.name": "a"})],
            events: vec![],
        };

        let verifier = Verifier::new(&backend, None, &settings, false);
        let (results, summary) = verifier
            .run(&[record("CVE-2021-44906", "user-auth-service", 129)])
            .await
            .unwrap();

        assert_eq!(results[0].status, Classification::NotConfirmed);
        assert!(results[0].reason.contains("running"));
        assert!(results[0].reason.contains("not found"));
        assert_eq!(summary.confirmed, 0);
    }

    #[tokio::test]
    async fn test_backend_error_resolves_to_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_settings(&dir.path().join("results.json"));

        let backend = ScriptedBackend {
            containers: vec![],
            events: vec![(
                "CVE-2023-41419".into(),
                QueryOutcome::Error("status 503".into()),
            )],
        };

        let verifier = Verifier::new(&backend, None, &settings, false);
        let (results, _) = verifier
            .run(&[record("CVE-2023-41419", "malicious-load-generator", 44)])
            .await
            .unwrap();

        // A failed query must classify through the no-events branches, not raise.
        assert_eq!(results[0].status, Classification::NotConfirmed);
        assert!(!results[0].security_events_found);
        assert!(results[0].reason.contains("not running"));
    }

    #[tokio::test]
    async fn test_results_preserve_catalog_order() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_settings(&dir.path().join("results.json"));

        let backend = ScriptedBackend { containers: vec![], events: vec![] };
        let catalog = vec![
            record("CVE-2023-41419", "svc-a", 1),
            record("CVE-2021-44906", "svc-b", 2),
            record("CVE-2024-21508", "svc-c", 3),
        ];

        let verifier = Verifier::new(&backend, None, &settings, false);
        let (results, summary) = verifier.run(&catalog).await.unwrap();

        let cves: Vec<_> = results.iter().map(|r| r.cve.as_str()).collect();
        assert_eq!(cves, vec!["CVE-2023-41419", "CVE-2021-44906", "CVE-2024-21508"]);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.not_confirmed, 3);
    }

    #[tokio::test]
    async fn test_unparseable_event_records_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let settings = test_settings(&dir.path().join("results.json"));

        let backend = ScriptedBackend {
            containers: vec![],
            events: vec![(
                "CVE-2024-21511".into(),
                // An array is not an object-shaped record; it gets dropped.
                QueryOutcome::Records(vec![json!([1, 2, 3]), in_use_event()]),
            )],
        };

        let verifier = Verifier::new(&backend, None, &settings, false);
        let (results, _) = verifier
            .run(&[record("CVE-2024-21511", "user-auth-service", 138)])
            .await
            .unwrap();

        assert_eq!(results[0].security_events_count, 1);
        assert_eq!(results[0].status, Classification::Confirmed);
    }
}
