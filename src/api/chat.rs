use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Json, Response};

use crate::api::sse_ok_response;
use crate::auth::resolve_credential;
use crate::error::{into_axum_response, ShimError};
use crate::protocol::openai_chat::ChatCompletionRequest;
use crate::state::AppState;

/// `POST /v1/chat/completions`.
pub async fn handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: bytes::Bytes,
) -> Response {
    match handler_inner(&state, &headers, &body).await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(error = %err, "chat completion failed");
            into_axum_response(&err)
        }
    }
}

async fn handler_inner(
    state: &AppState,
    headers: &HeaderMap,
    body: &bytes::Bytes,
) -> Result<Response, ShimError> {
    let request = parse_chat_request(body)?;
    let credential = resolve_credential(headers, state.fallback_api_key())?;
    let app = state
        .apps
        .resolve(&request.model)
        .ok_or_else(|| ShimError::ModelNotFound(request.model.clone()))?;

    let request_id = state.next_request_id();
    tracing::info!(
        request_id = %request_id,
        model = %request.model,
        app_id = %app.app_id,
        stream = request.is_stream(),
        "processing chat completion request"
    );

    if request.is_stream() {
        let chunks = state
            .translator
            .create_completion_stream(&request, credential, app)?;
        return Ok(sse_ok_response(Body::from_stream(chunks)));
    }

    let response = state
        .translator
        .create_completion(&request, credential, app)
        .await?;
    Ok(Json(response).into_response())
}

pub(crate) fn parse_chat_request(body: &[u8]) -> Result<ChatCompletionRequest, ShimError> {
    serde_json::from_slice(body).map_err(|err| {
        ShimError::InvalidRequest(format!("Invalid chat completion request body: {err}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_missing_messages() {
        let err = parse_chat_request(br#"{"model":"m"}"#).unwrap_err();
        assert!(matches!(err, ShimError::InvalidRequest(_)));
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(parse_chat_request(b"model=m").is_err());
    }

    #[test]
    fn test_parse_accepts_minimal_request() {
        let request =
            parse_chat_request(br#"{"model":"m","messages":[{"role":"user","content":"hi"}]}"#)
                .unwrap();
        assert_eq!(request.model, "m");
        assert!(!request.is_stream());
    }
}
