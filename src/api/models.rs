use std::sync::Arc;

use axum::extract::State;
use axum::response::Response;

use crate::api::json_bytes_response;
use crate::error::{into_axum_response, ShimError};
use crate::state::AppState;

/// List every configured app model in `OpenAI` format.
#[must_use]
pub fn list_handler(State(state): State<Arc<AppState>>) -> Response {
    json_bytes_response(state.models_response_body())
}

/// Fetch one model object, or a `model_not_found` error.
#[must_use]
pub fn get_handler(State(state): State<Arc<AppState>>, model_id: &str) -> Response {
    match state.model_response_body(model_id) {
        Some(body) => json_bytes_response(body),
        None => into_axum_response(&ShimError::ModelNotFound(model_id.to_string())),
    }
}
