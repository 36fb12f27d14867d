use http::header::AUTHORIZATION;

use crate::error::ShimError;

const BEARER_PREFIX: &str = "Bearer ";

/// Resolve the DashScope credential for one request.
///
/// `Authorization: Bearer <key>` wins. Without the header the configured
/// fallback key is used. A header that is not a non-empty bearer token is
/// rejected even when a fallback exists.
///
/// # Errors
///
/// Returns [`ShimError::Auth`] when no credential is available or the header
/// is malformed.
pub fn resolve_credential<'a>(
    headers: &'a http::HeaderMap,
    fallback: Option<&'a str>,
) -> Result<&'a str, ShimError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return fallback
            .ok_or_else(|| ShimError::Auth("Authorization header required".to_string()));
    };

    value
        .to_str()
        .ok()
        .and_then(|raw| raw.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ShimError::Auth("Invalid authorization format".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(value: &str) -> http::HeaderMap {
        let mut headers = http::HeaderMap::new();
        headers.insert(AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_is_used() {
        let headers = headers_with("Bearer sk-client");
        assert_eq!(
            resolve_credential(&headers, Some("sk-fallback")).unwrap(),
            "sk-client"
        );
    }

    #[test]
    fn test_missing_header_uses_fallback() {
        let headers = http::HeaderMap::new();
        assert_eq!(
            resolve_credential(&headers, Some("sk-fallback")).unwrap(),
            "sk-fallback"
        );
    }

    #[test]
    fn test_missing_header_without_fallback() {
        let headers = http::HeaderMap::new();
        let err = resolve_credential(&headers, None).unwrap_err();
        assert_eq!(err.to_string(), "Authorization header required");
    }

    #[test]
    fn test_non_bearer_header_rejected() {
        for value in ["Basic abc", "bearer sk", "Bearer ", "Token"] {
            let headers = headers_with(value);
            let err = resolve_credential(&headers, Some("sk-fallback")).unwrap_err();
            assert!(matches!(err, ShimError::Auth(ref msg) if msg == "Invalid authorization format"));
        }
    }
}
