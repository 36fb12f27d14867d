use std::time::Instant;

use crate::codec::{extract_answer_text, extract_reasoning_delta, sanitize_reasoning};
use crate::config::AppConfig;
use crate::error::ShimError;
use crate::observability::log_request_complete;
use crate::observability::token_counter::estimate_usage;
use crate::protocol::openai_chat::{
    ChatCompletionRequest, ChatCompletionResponse, Choice, ResponseMessage, Role,
    CHAT_COMPLETION_OBJECT, FINISH_REASON_STOP,
};
use crate::transport::map_reqwest_error;
use crate::util::unix_now_secs;

use super::{upstream_error_message, Translator};

impl Translator {
    /// Run one non-streaming completion against the application behind `app`.
    ///
    /// # Errors
    ///
    /// Returns [`ShimError::Upstream`] for non-2xx responses (carrying the
    /// decoded body), [`ShimError::Timeout`] or [`ShimError::Transport`] when
    /// the exchange fails, and [`ShimError::Internal`] when a 2xx body is not
    /// JSON.
    pub async fn create_completion(
        &self,
        request: &ChatCompletionRequest,
        credential: &str,
        app: &AppConfig,
    ) -> Result<ChatCompletionResponse, ShimError> {
        let started = Instant::now();
        let call = self.prepare_call(request, app)?;
        let response = self
            .transport
            .post_json(&call.url, credential, call.body, false)
            .await?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| map_reqwest_error(&err))?;

        if !status.is_success() {
            let message = upstream_error_message(&body);
            tracing::error!(
                status = status.as_u16(),
                app_id = %app.app_id,
                body = %message,
                "DashScope application call failed"
            );
            return Err(ShimError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let data: serde_json::Value = serde_json::from_slice(&body).map_err(|err| {
            ShimError::Internal(format!("Upstream returned invalid JSON: {err}"))
        })?;

        let answer = extract_answer_text(&data).to_owned();
        let reasoning_content = if call.params.has_thoughts {
            Some(sanitize_reasoning(
                &extract_reasoning_delta(&data),
                self.reasoning_max_len,
            ))
            .filter(|text| !text.is_empty())
        } else {
            None
        };

        let usage = estimate_usage(&call.prompt, &answer);
        log_request_complete(&request.model, &usage, false, started);

        Ok(ChatCompletionResponse {
            id: self.next_chat_id(),
            object: CHAT_COMPLETION_OBJECT.to_string(),
            created: unix_now_secs(),
            model: request.model.clone(),
            choices: vec![Choice {
                index: 0,
                message: ResponseMessage {
                    role: Role::Assistant,
                    content: answer,
                    reasoning_content,
                },
                finish_reason: Some(FINISH_REASON_STOP.to_string()),
            }],
            usage,
        })
    }
}
