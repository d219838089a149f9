use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::errors::VerifyError;

const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const PROTOCOL_VERSION: &str = "1.0";
const CLIENT_NAME: &str = "vulnverify-relay";
const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Mutable connection state. The relay has exactly one logical connection;
/// this is the only shared mutable state in the process.
#[derive(Debug, Default)]
struct ConnectionState {
    connected: bool,
    last_ping: Option<DateTime<Utc>>,
}

/// Pass-through client for the upstream MCP server. No retry policy, no
/// protocol state machine beyond the connected flag and last-ping timestamp.
pub struct RelayClient {
    client: Client,
    server_url: String,
    api_token: String,
    environment_id: String,
    timeout: Duration,
    state: RwLock<ConnectionState>,
}

impl RelayClient {
    pub fn new(
        client: Client,
        server_url: &str,
        api_token: &str,
        environment_id: &str,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            server_url: server_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
            environment_id: environment_id.to_string(),
            timeout,
            state: RwLock::new(ConnectionState::default()),
        }
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{}", self.server_url, path))
            .header("Authorization", format!("Api-Token {}", self.api_token))
            .header("Content-Type", "application/json")
            .header("User-Agent", format!("{}/{}", CLIENT_NAME, CLIENT_VERSION))
            .timeout(self.timeout)
    }

    fn message_id(prefix: &str) -> String {
        format!("{}_{}", prefix, uuid::Uuid::new_v4())
    }

    /// Probe upstream health, then send the initialize message. A failed
    /// initialize after a healthy probe still counts as connected.
    pub async fn connect(&self) -> Result<bool, VerifyError> {
        let health_url = format!("{}/health", self.server_url);
        let probe = self
            .client
            .get(&health_url)
            .header("Authorization", format!("Api-Token {}", self.api_token))
            .timeout(HEALTH_PROBE_TIMEOUT)
            .send()
            .await;

        let response = match probe {
            Ok(resp) => resp,
            Err(e) => {
                error!(error = %e, "Failed to reach upstream MCP server");
                self.state.write().await.connected = false;
                return Ok(false);
            }
        };

        if !response.status().is_success() {
            error!(status = %response.status(), "Upstream health check failed");
            return Ok(false);
        }

        let init = json!({
            "id": Self::message_id("init"),
            "method": "initialize",
            "params": {
                "protocolVersion": PROTOCOL_VERSION,
                "clientInfo": {
                    "name": CLIENT_NAME,
                    "version": CLIENT_VERSION,
                },
                "capabilities": {
                    "roots": {"listChanged": true},
                    "sampling": {},
                },
            },
        });

        match self.post("/initialize").json(&init).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("Connected to upstream MCP server");
            }
            Ok(resp) => {
                warn!(status = %resp.status(), "MCP initialization failed, connection kept");
            }
            Err(e) => {
                warn!(error = %e, "MCP initialization failed, connection kept");
            }
        }

        let mut state = self.state.write().await;
        state.connected = true;
        state.last_ping = Some(Utc::now());
        Ok(true)
    }

    pub async fn disconnect(&self) {
        let mut state = self.state.write().await;
        state.connected = false;
        info!("Disconnected from upstream MCP server");
    }

    pub async fn is_connected(&self) -> bool {
        self.state.read().await.connected
    }

    /// Forward application context upstream. Returns the upstream "result"
    /// payload, or None if not connected or the call failed.
    pub async fn send_context(&self, context: Value) -> Option<Value> {
        if !self.is_connected().await {
            warn!("Not connected to upstream MCP server");
            return None;
        }

        let message = json!({
            "id": Self::message_id("context"),
            "method": "sendContext",
            "params": {
                "environmentId": self.environment_id,
                "timestamp": Utc::now().timestamp_millis(),
                "context": context,
            },
        });

        self.forward("/context", &message).await
    }

    /// Request insights for a free-form query string.
    pub async fn get_insights(&self, query: &str) -> Option<Value> {
        if !self.is_connected().await {
            warn!("Not connected to upstream MCP server");
            return None;
        }

        let message = json!({
            "id": Self::message_id("insights"),
            "method": "getInsights",
            "params": {
                "environmentId": self.environment_id,
                "query": query,
                "timestamp": Utc::now().timestamp_millis(),
            },
        });

        self.forward("/insights", &message).await
    }

    /// Ping upstream to keep the connection alive. Any failure clears the
    /// connected flag.
    pub async fn ping(&self) -> bool {
        if !self.is_connected().await {
            return false;
        }

        let message = json!({
            "id": Self::message_id("ping"),
            "method": "ping",
            "params": {"timestamp": Utc::now().timestamp_millis()},
        });

        match self.post("/ping").json(&message).send().await {
            Ok(resp) if resp.status().is_success() => {
                self.state.write().await.last_ping = Some(Utc::now());
                true
            }
            Ok(resp) => {
                error!(status = %resp.status(), "Ping failed");
                self.state.write().await.connected = false;
                false
            }
            Err(e) => {
                error!(error = %e, "Ping failed");
                self.state.write().await.connected = false;
                false
            }
        }
    }

    /// Snapshot of the connection state for health and status endpoints.
    pub async fn status(&self) -> Value {
        let state = self.state.read().await;
        let uptime_seconds = state
            .last_ping
            .map(|t| (Utc::now() - t).num_seconds().max(0))
            .unwrap_or(0);

        json!({
            "connected": state.connected,
            "server_url": self.server_url,
            "environment_id": self.environment_id,
            "last_ping": state.last_ping.map(|t| t.to_rfc3339()),
            "uptime": uptime_seconds,
        })
    }

    async fn forward(&self, path: &str, message: &Value) -> Option<Value> {
        match self.post(path).json(message).send().await {
            Ok(resp) if resp.status().is_success() => match resp.json::<Value>().await {
                Ok(body) => body.get("result").cloned().filter(|r| !r.is_null()),
                Err(e) => {
                    error!(path, error = %e, "Upstream response was not JSON");
                    None
                }
            },
            Ok(resp) => {
                error!(path, status = %resp.status(), "Upstream call failed");
                None
            }
            Err(e) => {
                error!(path, error = %e, "Upstream call failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> RelayClient {
        RelayClient::new(
            Client::new(),
            "https://localhost:1/mcp/",
            "demo-token",
            "demo-env",
            Duration::from_secs(30),
        )
    }

    #[tokio::test]
    async fn test_initial_state_disconnected() {
        let relay = test_client();
        assert!(!relay.is_connected().await);

        let status = relay.status().await;
        assert_eq!(status["connected"], false);
        assert_eq!(status["server_url"], "https://localhost:1/mcp");
        assert_eq!(status["environment_id"], "demo-env");
        assert!(status["last_ping"].is_null());
        assert_eq!(status["uptime"], 0);
    }

    #[tokio::test]
    async fn test_send_context_requires_connection() {
        let relay = test_client();
        assert!(relay.send_context(serde_json::json!({"k": "v"})).await.is_none());
        assert!(relay.get_insights("application performance").await.is_none());
        assert!(!relay.ping().await);
    }

    #[tokio::test]
    async fn test_disconnect_clears_flag() {
        let relay = test_client();
        relay.state.write().await.connected = true;
        assert!(relay.is_connected().await);
        relay.disconnect().await;
        assert!(!relay.is_connected().await);
    }

    #[test]
    fn test_message_ids_are_unique() {
        let a = RelayClient::message_id("ping");
        let b = RelayClient::message_id("ping");
        assert!(a.starts_with("ping_"));
        assert_ne!(a, b);
    }
}
