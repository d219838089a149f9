use reqwest::Client;
use serde_json::json;
use tracing::{error, info};

use crate::errors::VerifyError;

const API_BASE: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const ACCEPT: &str = "application/vnd.github+json";

/// Dismissal reason accepted by the Dependabot alerts API for alerts whose
/// vulnerable code was never observed executing.
pub const DISMISS_REASON_NOT_USED: &str = "vulnerable_code_not_actually_used";

/// Client for the alert-tracking side effects: dismissing Dependabot alerts
/// and posting verification reports as issue comments.
pub struct GithubClient {
    client: Client,
    token: String,
    owner: String,
    repo: String,
    base_url: String,
}

impl GithubClient {
    pub fn new(client: Client, token: String, owner: &str, repo: &str) -> Self {
        Self {
            client,
            token,
            owner: owner.to_string(),
            repo: repo.to_string(),
            base_url: API_BASE.to_string(),
        }
    }

    /// PATCH the alert into the dismissed state with a recorded reason.
    pub async fn dismiss_alert(
        &self,
        alert_id: u64,
        reason: &str,
        comment: &str,
    ) -> Result<(), VerifyError> {
        let url = format!(
            "{}/repos/{}/{}/dependabot/alerts/{}",
            self.base_url, self.owner, self.repo, alert_id
        );

        let body = json!({
            "state": "dismissed",
            "dismissed_reason": reason,
            "dismissed_comment": comment,
        });

        let response = self
            .client
            .patch(&url)
            .header("Accept", ACCEPT)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", "vulnverify")
            .json(&body)
            .send()
            .await
            .map_err(|e| VerifyError::GitHub(format!("dismiss request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!(alert_id, status = %status, "Alert dismissal rejected");
            return Err(VerifyError::GitHub(format!(
                "dismiss alert {} returned {}: {}",
                alert_id, status, detail
            )));
        }

        info!(alert_id, "Dismissed alert");
        Ok(())
    }

    /// POST a markdown comment to the tracking issue.
    pub async fn post_issue_comment(
        &self,
        issue_number: u64,
        body: &str,
    ) -> Result<(), VerifyError> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.base_url, self.owner, self.repo, issue_number
        );

        let response = self
            .client
            .post(&url)
            .header("Accept", ACCEPT)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", "vulnverify")
            .json(&json!({ "body": body }))
            .send()
            .await
            .map_err(|e| VerifyError::GitHub(format!("comment request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!(issue_number, status = %status, "Issue comment rejected");
            return Err(VerifyError::GitHub(format!(
                "comment on issue {} returned {}: {}",
                issue_number, status, detail
            )));
        }

        info!(issue_number, "Posted verification report comment");
        Ok(())
    }
}
