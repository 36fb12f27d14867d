use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use serde_json::{json, Value};

use crate::state::AppState;

const SERVICE_NAME: &str = "DashScope App API Shim";
const SERVICE_DESCRIPTION: &str =
    "OpenAI-compatible API for Aliyun Bailian (DashScope) applications";

/// Service banner served at the root path.
pub fn root_handler() -> Json<Value> {
    Json(json!({
        "name": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "description": SERVICE_DESCRIPTION,
    }))
}

/// Health check handler.
/// Returns JSON with status, version and the number of published apps.
pub fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "apps": state.apps.len(),
    }))
}
