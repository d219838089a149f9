use tracing::debug;

use crate::errors::VerifyError;

/// Image path prefix for the container presence check. The owning service's
/// name is appended to this before segment matching.
pub const DEFAULT_IMAGE_PREFIX: &str = "appsec-ai-initiative-dev/unguard/src";

pub const DEFAULT_REPO_OWNER: &str = "appsec-ai-initiative-dev";
pub const DEFAULT_REPO_NAME: &str = "unguard";
pub const DEFAULT_REPORT_ISSUE: u64 = 432;
pub const DEFAULT_RESULTS_PATH: &str = "/tmp/verification_results.json";

/// How query requests authenticate against the observability backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendAuth {
    /// Direct tenant access via `Authorization: Api-Token <token>` against
    /// the public query endpoint.
    ApiToken(String),
    /// Gateway access: no auth header, the gateway injects credentials.
    Gateway,
}

/// Environment-derived configuration, read once at startup. Missing required
/// variables fail here, before any network call is made.
#[derive(Debug, Clone)]
pub struct Settings {
    pub backend_base_url: String,
    pub backend_environment: String,
    pub backend_auth: BackendAuth,
    pub github_token: Option<String>,
    pub repo_owner: String,
    pub repo_name: String,
    pub report_issue: u64,
    pub image_prefix: String,
    pub results_path: String,
}

impl Settings {
    /// Load settings from the process environment. `gateway` selects the
    /// unauthenticated gateway execute path instead of the tenant API; in
    /// that mode `DT_API_TOKEN` is not required.
    pub fn from_env(gateway: bool) -> Result<Self, VerifyError> {
        let backend_base_url = require_env("DT_BASE_URL")?;
        let backend_environment = require_env("DT_ENVIRONMENT")?;

        let backend_auth = if gateway {
            BackendAuth::Gateway
        } else {
            BackendAuth::ApiToken(require_env("DT_API_TOKEN")?)
        };

        let github_token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());
        if github_token.is_none() {
            debug!("GITHUB_TOKEN not set, alert dismissal and commenting disabled");
        }

        Ok(Self {
            backend_base_url: backend_base_url.trim_end_matches('/').to_string(),
            backend_environment,
            backend_auth,
            github_token,
            repo_owner: DEFAULT_REPO_OWNER.to_string(),
            repo_name: DEFAULT_REPO_NAME.to_string(),
            report_issue: DEFAULT_REPORT_ISSUE,
            image_prefix: DEFAULT_IMAGE_PREFIX.to_string(),
            results_path: DEFAULT_RESULTS_PATH.to_string(),
        })
    }
}

fn require_env(name: &str) -> Result<String, VerifyError> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(VerifyError::Config(format!(
            "Missing required environment variable: {}",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_env_missing_is_config_error() {
        std::env::remove_var("VULNVERIFY_TEST_UNSET");
        let err = require_env("VULNVERIFY_TEST_UNSET").unwrap_err();
        assert!(matches!(err, VerifyError::Config(_)));
    }

    #[test]
    fn test_require_env_empty_is_config_error() {
        std::env::set_var("VULNVERIFY_TEST_EMPTY", "  ");
        let err = require_env("VULNVERIFY_TEST_EMPTY").unwrap_err();
        assert!(matches!(err, VerifyError::Config(_)));
        std::env::remove_var("VULNVERIFY_TEST_EMPTY");
    }
}
