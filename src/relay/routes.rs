use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use super::AppState;

type HandlerResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let status = state.relay.status().await;
    Json(json!({
        "status": "healthy",
        "service": "vulnverify-relay",
        "version": env!("CARGO_PKG_VERSION"),
        "built": env!("BUILD_TIMESTAMP"),
        "mcp_connection": status,
    }))
}

pub async fn connect(State(state): State<AppState>) -> HandlerResult {
    match state.relay.connect().await {
        Ok(true) => Ok(Json(json!({
            "status": "connected",
            "message": "Successfully connected to upstream MCP server",
        }))),
        Ok(false) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status": "failed",
                "message": "Failed to connect to upstream MCP server",
            })),
        )),
        Err(e) => {
            error!(error = %e, "Connection error");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"status": "error", "message": e.to_string()})),
            ))
        }
    }
}

pub async fn disconnect(State(state): State<AppState>) -> Json<Value> {
    state.relay.disconnect().await;
    Json(json!({
        "status": "disconnected",
        "message": "Disconnected from upstream MCP server",
    }))
}

pub async fn send_context(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> HandlerResult {
    let context = match body {
        Some(Json(value)) if !value.is_null() => value,
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "No context data provided"})),
            ))
        }
    };

    match state.relay.send_context(context).await {
        Some(result) => Ok(Json(json!({"status": "sent", "result": result}))),
        None => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status": "failed",
                "message": "Failed to send context to upstream MCP server",
            })),
        )),
    }
}

#[derive(Debug, Deserialize)]
pub struct InsightsParams {
    query: Option<String>,
}

pub async fn insights(
    State(state): State<AppState>,
    Query(params): Query<InsightsParams>,
) -> HandlerResult {
    let query = params
        .query
        .unwrap_or_else(|| "application performance".to_string());

    match state.relay.get_insights(&query).await {
        Some(result) => Ok(Json(json!({"status": "success", "insights": result}))),
        None => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status": "failed",
                "message": "Failed to get insights from upstream MCP server",
            })),
        )),
    }
}

pub async fn status(State(state): State<AppState>) -> Json<Value> {
    Json(state.relay.status().await)
}

pub async fn ping(State(state): State<AppState>) -> HandlerResult {
    if state.relay.ping().await {
        Ok(Json(json!({
            "status": "pong",
            "message": "Upstream MCP server responded to ping",
        })))
    } else {
        Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status": "failed",
                "message": "Upstream MCP server did not respond to ping",
            })),
        ))
    }
}
