use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::config::{BackendAuth, Settings};

/// Query request timeout, matched by the `requestTimeoutMilliseconds` hint
/// sent to the backend.
const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of one query execution. The backend cannot distinguish "no rows"
/// from "query failed" on its own, so the client keeps the two apart and
/// lets callers decide how to collapse them.
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    Records(Vec<Value>),
    Empty,
    Error(String),
}

impl QueryOutcome {
    /// Collapse to a record list, treating errors as empty. This mirrors the
    /// verifier's classification contract; the error itself is already logged
    /// at the call site.
    pub fn into_records(self) -> Vec<Value> {
        match self {
            QueryOutcome::Records(records) => records,
            QueryOutcome::Empty | QueryOutcome::Error(_) => Vec::new(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, QueryOutcome::Error(_))
    }
}

/// The execute endpoint answers with one of two envelopes depending on which
/// gateway the request went through. Unwrapping happens here, once, at the
/// boundary.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QueryEnvelope {
    Nested { result: RecordSet },
    Flat { records: Vec<Value> },
}

#[derive(Debug, Deserialize)]
struct RecordSet {
    records: Vec<Value>,
}

impl QueryEnvelope {
    fn into_records(self) -> Vec<Value> {
        match self {
            QueryEnvelope::Nested { result } => result.records,
            QueryEnvelope::Flat { records } => records,
        }
    }
}

/// Seam between the verifier and the observability backend. Production uses
/// [`DynatraceClient`]; tests script outcomes per query.
#[async_trait]
pub trait SecurityBackend: Send + Sync {
    async fn execute(&self, query: &str) -> QueryOutcome;
}

/// Client for the backend's DQL execute endpoint. Holds the shared HTTP
/// client; construct once at startup and pass by reference.
pub struct DynatraceClient {
    client: Client,
    base_url: String,
    auth: BackendAuth,
}

impl DynatraceClient {
    pub fn new(client: Client, settings: &Settings) -> Self {
        Self {
            client,
            base_url: settings.backend_base_url.clone(),
            auth: settings.backend_auth.clone(),
        }
    }

    fn execute_url(&self) -> String {
        match self.auth {
            BackendAuth::ApiToken(_) => format!("{}/api/v2/query/execute", self.base_url),
            BackendAuth::Gateway => format!("{}/dt-security/v1/query/execute", self.base_url),
        }
    }
}

#[async_trait]
impl SecurityBackend for DynatraceClient {
    /// Submit a query and parse the response envelope. Transport failures and
    /// non-2xx statuses are logged and surface as [`QueryOutcome::Error`];
    /// nothing is retried.
    async fn execute(&self, query: &str) -> QueryOutcome {
        debug!(query = %query.chars().take(100).collect::<String>(), "Executing DQL query");

        let body = json!({
            "query": query,
            "requestTimeoutMilliseconds": QUERY_TIMEOUT.as_millis() as u64,
        });

        let mut request = self
            .client
            .post(self.execute_url())
            .header("Content-Type", "application/json")
            .timeout(QUERY_TIMEOUT)
            .json(&body);

        if let BackendAuth::ApiToken(token) = &self.auth {
            request = request.header("Authorization", format!("Api-Token {}", token));
        }

        let response = match request.send().await {
            Ok(resp) => resp,
            Err(e) => {
                error!(error = %e, "Query request failed");
                return QueryOutcome::Error(format!("request failed: {}", e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!(status = %status, "Query returned non-success status");
            return QueryOutcome::Error(format!("status {}: {}", status, detail));
        }

        let envelope: QueryEnvelope = match response.json().await {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(error = %e, "Query response was not a known envelope");
                return QueryOutcome::Error(format!("unexpected response shape: {}", e));
            }
        };

        let records = envelope.into_records();
        if records.is_empty() {
            QueryOutcome::Empty
        } else {
            QueryOutcome::Records(records)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_nested_variant() {
        let envelope: QueryEnvelope =
            serde_json::from_value(json!({"result": {"records": [{"a": 1}, {"a": 2}]}})).unwrap();
        assert_eq!(envelope.into_records().len(), 2);
    }

    #[test]
    fn test_envelope_flat_variant() {
        let envelope: QueryEnvelope =
            serde_json::from_value(json!({"records": [{"a": 1}]})).unwrap();
        assert_eq!(envelope.into_records().len(), 1);
    }

    #[test]
    fn test_envelope_rejects_unknown_shape() {
        let parsed: Result<QueryEnvelope, _> = serde_json::from_value(json!({"rows": []}));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_outcome_error_collapses_to_no_records() {
        let outcome = QueryOutcome::Error("status 503".into());
        assert!(outcome.is_error());
        assert!(outcome.into_records().is_empty());
    }

    #[test]
    fn test_execute_url_per_auth_mode() {
        let client = DynatraceClient {
            client: Client::new(),
            base_url: "https://abc123.live.example.com".into(),
            auth: BackendAuth::ApiToken("tok".into()),
        };
        assert_eq!(
            client.execute_url(),
            "https://abc123.live.example.com/api/v2/query/execute"
        );

        let client = DynatraceClient {
            client: Client::new(),
            base_url: "https://gateway.example.com".into(),
            auth: BackendAuth::Gateway,
        };
        assert_eq!(
            client.execute_url(),
            "https://gateway.example.com/dt-security/v1/query/execute"
        );
    }
}
