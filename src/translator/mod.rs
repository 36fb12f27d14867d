//! OpenAI chat completions over DashScope application calls.
//!
//! A [`Translator`] holds the fixed upstream settings and turns one
//! [`ChatCompletionRequest`] into one application call, either as a single
//! JSON exchange ([`Translator::create_completion`]) or as a lazily driven
//! stream of chunk frames ([`Translator::create_completion_stream`]).

mod completion;
mod params;
mod streaming;

pub use params::{resolve_thinking_params, ThinkingDefaults, ThinkingParams};
pub use streaming::ChunkStream;

use crate::codec::messages_to_prompt;
use crate::config::{AppConfig, ShimConfig};
use crate::error::ShimError;
use crate::protocol::dashscope::{app_completion_url, AppCompletionRequest, AppInput};
use crate::protocol::openai_chat::ChatCompletionRequest;
use crate::state::request_id::RequestIdGenerator;
use crate::transport::HttpTransport;

/// Upstream call prepared from one chat request.
#[derive(Debug)]
pub(crate) struct PreparedCall {
    pub(crate) url: String,
    pub(crate) body: bytes::Bytes,
    pub(crate) prompt: String,
    pub(crate) params: ThinkingParams,
}

/// Read-only after construction; share it behind an `Arc`.
#[derive(Debug)]
pub struct Translator {
    base_url: String,
    reasoning_max_len: usize,
    default_reasoning_effort: Option<String>,
    synthesize_stream_end: bool,
    transport: HttpTransport,
    ids: RequestIdGenerator,
}

impl Translator {
    /// Build a translator from the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ShimError::Config`] when the HTTP client cannot be built.
    pub fn new(config: &ShimConfig) -> Result<Self, ShimError> {
        let transport = HttpTransport::new(config)?;
        Ok(Self {
            base_url: config.dashscope.base_url.trim_end_matches('/').to_string(),
            reasoning_max_len: config.dashscope.reasoning_delta_max,
            default_reasoning_effort: config.features.default_reasoning_effort.clone(),
            synthesize_stream_end: config.features.synthesize_stream_end,
            transport,
            ids: RequestIdGenerator::new(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Thinking switches this translator would send for `request` to `app`.
    #[must_use]
    pub fn thinking_params(&self, request: &ChatCompletionRequest, app: &AppConfig) -> ThinkingParams {
        resolve_thinking_params(
            request,
            ThinkingDefaults::for_app(app, self.default_reasoning_effort.as_deref()),
        )
    }

    pub(crate) fn next_chat_id(&self) -> String {
        self.ids.next_chat_id()
    }

    pub(crate) fn prepare_call(
        &self,
        request: &ChatCompletionRequest,
        app: &AppConfig,
    ) -> Result<PreparedCall, ShimError> {
        let prompt = messages_to_prompt(&request.messages);
        let params = self.thinking_params(request, app);
        let body = serde_json::to_vec(&AppCompletionRequest {
            input: AppInput { prompt: &prompt },
            parameters: params.into(),
        })
        .map_err(|err| ShimError::Internal(format!("Failed to encode upstream request: {err}")))?;

        tracing::info!(
            model = %request.model,
            app_id = %app.app_id,
            stream = request.is_stream(),
            has_thoughts = params.has_thoughts,
            enable_thinking = params.enable_thinking,
            incremental_output = params.incremental_output,
            "forwarding chat completion to application"
        );

        Ok(PreparedCall {
            url: app_completion_url(&self.base_url, &app.app_id),
            body: bytes::Bytes::from(body),
            prompt,
            params,
        })
    }
}

/// Text of a non-2xx upstream body: compact JSON when it decodes, the raw
/// text otherwise.
pub(crate) fn upstream_error_message(body: &[u8]) -> String {
    if body.is_empty() {
        return String::new();
    }
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => value.to_string(),
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    }
}
