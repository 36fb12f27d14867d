use std::time::Duration;

use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::HeaderValue;

use crate::config::ShimConfig;
use crate::error::ShimError;
use crate::protocol::dashscope::SSE_ENABLE_HEADER;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

fn build_reqwest_client(
    pool_max_idle_per_host: usize,
    pool_idle_timeout: Option<Duration>,
    timeout: Duration,
    use_env_proxy: bool,
    proxy_url: Option<&str>,
) -> Result<reqwest::Client, ShimError> {
    let mut builder = reqwest::Client::builder()
        .pool_max_idle_per_host(pool_max_idle_per_host)
        .pool_idle_timeout(pool_idle_timeout)
        .tcp_nodelay(true)
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(reqwest::redirect::Policy::none())
        .timeout(timeout);

    if let Some(proxy_url) = proxy_url {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|err| ShimError::Config(format!("Invalid proxy URL: {err}")))?;
        builder = builder.no_proxy().proxy(proxy);
    } else if !use_env_proxy {
        builder = builder.no_proxy();
    }

    builder
        .build()
        .map_err(|err| ShimError::Config(format!("Failed to build HTTP client: {err}")))
}

/// Classify a reqwest failure: deadline hits become [`ShimError::Timeout`],
/// everything else [`ShimError::Transport`].
#[must_use]
pub fn map_reqwest_error(err: &reqwest::Error) -> ShimError {
    if err.is_timeout() {
        ShimError::Timeout(err.to_string())
    } else {
        ShimError::Transport(err.to_string())
    }
}

/// Pooled HTTP client for DashScope application calls.
///
/// One client is built at startup and shared by every request. The
/// configured timeout bounds each exchange end to end, including the time
/// spent reading a streamed body.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build the transport from server and upstream settings.
    ///
    /// # Errors
    ///
    /// Returns [`ShimError::Config`] when the proxy URL is rejected or the
    /// client cannot be constructed.
    pub fn new(config: &ShimConfig) -> Result<Self, ShimError> {
        let server = &config.server;
        let pool_idle_timeout = if server.http_pool_idle_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(server.http_pool_idle_timeout_secs))
        };
        let timeout = Duration::from_secs(server.timeout);
        let client = build_reqwest_client(
            server.http_pool_max_idle_per_host.max(1),
            pool_idle_timeout,
            timeout,
            server.http_use_env_proxy,
            config.dashscope.proxy.as_deref(),
        )?;
        Ok(Self { client })
    }

    /// POST a JSON body with a bearer credential. With `stream` set the
    /// request asks for an SSE response.
    ///
    /// Non-2xx responses are returned as-is; callers decide how to surface
    /// them.
    ///
    /// # Errors
    ///
    /// Returns [`ShimError::Timeout`] when the deadline passes before the
    /// response head arrives, [`ShimError::Transport`] for connect and I/O
    /// failures, or [`ShimError::Auth`] when the credential cannot be used as
    /// a header value.
    pub async fn post_json(
        &self,
        url: &str,
        credential: &str,
        body: bytes::Bytes,
        stream: bool,
    ) -> Result<reqwest::Response, ShimError> {
        let mut bearer = String::with_capacity(7 + credential.len());
        bearer.push_str("Bearer ");
        bearer.push_str(credential);
        let authorization = HeaderValue::try_from(bearer)
            .map_err(|_| ShimError::Auth("Invalid authorization format".to_string()))?;

        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(AUTHORIZATION, authorization)
            .body(body);
        if stream {
            request = request
                .header(ACCEPT, HeaderValue::from_static("text/event-stream"))
                .header(SSE_ENABLE_HEADER, HeaderValue::from_static("enable"));
        }

        request.send().await.map_err(|err| {
            tracing::debug!(error = %err, url, "upstream request failed");
            map_reqwest_error(&err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_transport_builds_from_defaults() {
        let config = ShimConfig::with_apps(vec![AppConfig::new("m", "a")]);
        assert_eq!(config.server.timeout, 600);
        assert!(HttpTransport::new(&config).is_ok());
    }

    #[test]
    fn test_transport_accepts_http_proxy() {
        let mut config = ShimConfig::with_apps(vec![AppConfig::new("m", "a")]);
        config.dashscope.proxy = Some("http://127.0.0.1:3128".to_string());
        assert!(HttpTransport::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_connect_failure_is_transport_error() {
        let mut config = ShimConfig::with_apps(vec![AppConfig::new("m", "a")]);
        config.server.timeout = 5;
        let transport = HttpTransport::new(&config).unwrap();
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = transport
            .post_json(&format!("http://{addr}/x"), "sk", bytes::Bytes::new(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, ShimError::Transport(_) | ShimError::Timeout(_)));
    }
}
