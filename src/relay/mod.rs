pub mod client;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::errors::VerifyError;

pub use client::RelayClient;

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<RelayClient>,
}

/// Build relay state from the process environment. All variables have demo
/// defaults; the relay is an auxiliary surface, not the verification core.
pub fn create_app_state(client: reqwest::Client) -> Result<AppState, VerifyError> {
    let server_url =
        std::env::var("MCP_SERVER_URL").unwrap_or_else(|_| "https://localhost/mcp".to_string());
    let api_token = std::env::var("MCP_API_TOKEN").unwrap_or_else(|_| "demo-token".to_string());
    let environment_id =
        std::env::var("MCP_ENVIRONMENT_ID").unwrap_or_else(|_| "demo-env".to_string());
    let timeout = std::env::var("MCP_CONNECTION_TIMEOUT")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(30);

    let relay = RelayClient::new(
        client,
        &server_url,
        &api_token,
        &environment_id,
        Duration::from_secs(timeout),
    );

    Ok(AppState { relay: Arc::new(relay) })
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", axum::routing::get(routes::health))
        .route("/mcp/connect", axum::routing::post(routes::connect))
        .route("/mcp/disconnect", axum::routing::post(routes::disconnect))
        .route("/mcp/send-context", axum::routing::post(routes::send_context))
        .route("/mcp/insights", axum::routing::get(routes::insights))
        .route("/mcp/status", axum::routing::get(routes::status))
        .route("/mcp/ping", axum::routing::post(routes::ping))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
