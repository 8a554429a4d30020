use axum::{extract::State, Json};
use serde_json::Value;

use crate::app_state::AppState;

/// Health check endpoint; also lists the channels this server hosts.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "server": "toolwire",
        "version": env!("CARGO_PKG_VERSION"),
        "channels": state.tools.channels(),
    }))
}
