//! HTTP API endpoint handlers.
//!
//! The page-rendering front end lives elsewhere; this process only serves a
//! service description at the root and a health check endpoint.

use axum::Json;

/// Root endpoint: one-line service description.
pub async fn root() -> &'static str {
    "Websocket relay server for partyline. Connect via WebSocket at /ws"
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
