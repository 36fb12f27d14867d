use crate::protocol::error_shapes::openai_error_payload;

/// Crate-wide error type shared by the translator, transport and HTTP layers.
#[derive(Debug, thiserror::Error)]
pub enum ShimError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("{0}")]
    Auth(String),
    #[error("Model '{0}' not found. Please check /v1/models for available models.")]
    ModelNotFound(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Upstream error: status={status}, message={message}")]
    Upstream { status: u16, message: String },
    #[error("Upstream timeout: {0}")]
    Timeout(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Malformed SSE frame: {0}")]
    MalformedFrame(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Broad error category for status code and error body selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidRequest,
    Authentication,
    Permission,
    NotFound,
    RateLimit,
    Timeout,
    ServerError,
    Unknown,
}

/// Map an upstream HTTP status code to an error category.
#[must_use]
pub fn category_from_upstream_status(status: u16) -> ErrorCategory {
    match status {
        400 => ErrorCategory::InvalidRequest,
        401 => ErrorCategory::Authentication,
        403 => ErrorCategory::Permission,
        404 => ErrorCategory::NotFound,
        408 | 504 => ErrorCategory::Timeout,
        429 => ErrorCategory::RateLimit,
        500..=599 => ErrorCategory::ServerError,
        _ => ErrorCategory::Unknown,
    }
}

impl ShimError {
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            ShimError::InvalidRequest(_) => ErrorCategory::InvalidRequest,
            ShimError::Auth(_) => ErrorCategory::Authentication,
            ShimError::ModelNotFound(_) => ErrorCategory::NotFound,
            ShimError::Timeout(_) => ErrorCategory::Timeout,
            ShimError::Config(_)
            | ShimError::Transport(_)
            | ShimError::MalformedFrame(_)
            | ShimError::Internal(_) => ErrorCategory::ServerError,
            ShimError::Upstream { status, .. } => category_from_upstream_status(*status),
        }
    }

    /// Machine-readable `error.code`, overriding the category default where the
    /// OpenAI protocol defines a more specific one.
    #[must_use]
    pub fn code_override(&self) -> Option<&'static str> {
        match self {
            ShimError::ModelNotFound(_) => Some("model_not_found"),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Category -> HTTP status code
// ---------------------------------------------------------------------------

fn http_status_for_category(cat: ErrorCategory) -> http::StatusCode {
    match cat {
        ErrorCategory::InvalidRequest => http::StatusCode::BAD_REQUEST,
        ErrorCategory::Authentication => http::StatusCode::UNAUTHORIZED,
        ErrorCategory::Permission => http::StatusCode::FORBIDDEN,
        ErrorCategory::NotFound => http::StatusCode::NOT_FOUND,
        ErrorCategory::RateLimit => http::StatusCode::TOO_MANY_REQUESTS,
        ErrorCategory::Timeout => http::StatusCode::GATEWAY_TIMEOUT,
        ErrorCategory::ServerError | ErrorCategory::Unknown => {
            http::StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Format an error as (`status_code`, OpenAI-shaped JSON body).
#[must_use]
pub fn format_error(err: &ShimError) -> (http::StatusCode, serde_json::Value) {
    let cat = err.category();
    let status = http_status_for_category(cat);
    let body = openai_error_payload(cat, err.code_override(), &err.to_string());
    (status, body)
}

// ---------------------------------------------------------------------------
// Axum integration
// ---------------------------------------------------------------------------

/// Convert a `ShimError` into an axum response.
#[must_use]
pub fn into_axum_response(err: &ShimError) -> axum::response::Response {
    use axum::response::IntoResponse;
    let (status, body) = format_error(err);
    (status, axum::Json(body)).into_response()
}

impl axum::response::IntoResponse for ShimError {
    fn into_response(self) -> axum::response::Response {
        into_axum_response(&self)
    }
}
