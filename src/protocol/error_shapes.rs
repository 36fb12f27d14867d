use crate::error::ErrorCategory;

fn openai_error_type(cat: ErrorCategory) -> &'static str {
    match cat {
        ErrorCategory::InvalidRequest | ErrorCategory::NotFound => "invalid_request_error",
        ErrorCategory::Authentication => "authentication_error",
        ErrorCategory::Permission => "permission_error",
        ErrorCategory::RateLimit => "rate_limit_error",
        ErrorCategory::Timeout => "timeout_error",
        ErrorCategory::ServerError | ErrorCategory::Unknown => "server_error",
    }
}

fn openai_error_code(cat: ErrorCategory) -> &'static str {
    match cat {
        ErrorCategory::InvalidRequest => "invalid_request",
        ErrorCategory::Authentication => "invalid_api_key",
        ErrorCategory::Permission => "permission_denied",
        ErrorCategory::NotFound => "not_found",
        ErrorCategory::RateLimit => "rate_limit_exceeded",
        ErrorCategory::Timeout => "upstream_timeout",
        ErrorCategory::ServerError | ErrorCategory::Unknown => "server_error",
    }
}

/// Build an OpenAI-style `{error:{message,type,code,param}}` body.
#[must_use]
pub(crate) fn openai_error_payload(
    cat: ErrorCategory,
    code: Option<&str>,
    message: &str,
) -> serde_json::Value {
    serde_json::json!({
        "error": {
            "message": message,
            "type": openai_error_type(cat),
            "code": code.unwrap_or_else(|| openai_error_code(cat)),
            "param": null,
        }
    })
}
