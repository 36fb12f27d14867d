use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Instant;

use futures_util::stream::{self, BoxStream};
use futures_util::{Stream, StreamExt};

use crate::config::AppConfig;
use crate::error::ShimError;
use crate::observability::log_request_complete;
use crate::observability::token_counter::count_whitespace_tokens;
use crate::protocol::openai_chat::{ChatCompletionRequest, Usage};
use crate::stream::{Frames, StreamSession};
use crate::transport::{map_reqwest_error, HttpTransport};
use crate::util::unix_now_secs;

use super::{PreparedCall, Translator};

/// Pre-framed SSE text, one chunk per item. An `Err` item means the upstream
/// connection failed after streaming had started.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String, ShimError>> + Send>>;

type UpstreamBody = BoxStream<'static, reqwest::Result<bytes::Bytes>>;

struct PendingCall {
    transport: HttpTransport,
    url: String,
    credential: String,
    body: bytes::Bytes,
    app_id: String,
}

struct StreamState {
    call: Option<PendingCall>,
    upstream: Option<UpstreamBody>,
    session: StreamSession,
    pending: VecDeque<String>,
    done: bool,
    synthesize_stream_end: bool,
    model: String,
    prompt_tokens: u64,
    started: Instant,
}

impl Translator {
    /// Start a streaming completion.
    ///
    /// Nothing is sent upstream until the returned stream is first polled.
    /// Dropping the stream drops the upstream response body, which closes
    /// the connection.
    ///
    /// # Errors
    ///
    /// Returns [`ShimError::Internal`] when the upstream request body cannot
    /// be encoded. Upstream failures are reported in-band.
    pub fn create_completion_stream(
        &self,
        request: &ChatCompletionRequest,
        credential: &str,
        app: &AppConfig,
    ) -> Result<ChunkStream, ShimError> {
        let started = Instant::now();
        let PreparedCall {
            url,
            body,
            prompt,
            params,
        } = self.prepare_call(request, app)?;

        let chat_id = self.next_chat_id();
        let session = StreamSession::new(
            &chat_id,
            &request.model,
            unix_now_secs(),
            params.has_thoughts,
            self.reasoning_max_len,
        );

        let state = StreamState {
            call: Some(PendingCall {
                transport: self.transport.clone(),
                url,
                credential: credential.to_string(),
                body,
                app_id: app.app_id.clone(),
            }),
            upstream: None,
            session,
            pending: VecDeque::new(),
            done: false,
            synthesize_stream_end: self.synthesize_stream_end,
            model: request.model.clone(),
            prompt_tokens: count_whitespace_tokens(&prompt),
            started,
        };

        Ok(Box::pin(stream::unfold(state, next_item)))
    }
}

async fn next_item(mut state: StreamState) -> Option<(Result<String, ShimError>, StreamState)> {
    loop {
        if let Some(frame) = state.pending.pop_front() {
            return Some((Ok(frame), state));
        }
        if state.done {
            return None;
        }

        if let Some(call) = state.call.take() {
            open_upstream(&mut state, call).await;
            continue;
        }

        let Some(upstream) = state.upstream.as_mut() else {
            state.done = true;
            continue;
        };

        match upstream.next().await {
            Some(Ok(bytes)) => {
                let mut frames = Frames::new();
                state.session.feed_bytes(&bytes, &mut frames);
                state.pending.extend(frames);
                if state.session.is_finished() {
                    state.close();
                }
            }
            Some(Err(err)) => {
                let err = map_reqwest_error(&err);
                tracing::error!(error = %err, model = %state.model, "upstream stream failed mid-response");
                state.close();
                return Some((Err(err), state));
            }
            None => {
                if !state.session.is_finished() {
                    if state.synthesize_stream_end {
                        tracing::warn!(
                            model = %state.model,
                            "upstream stream ended without a terminal marker, synthesizing stop"
                        );
                        let frames = state.session.finish_frames();
                        state.pending.extend(frames);
                    } else {
                        tracing::warn!(
                            model = %state.model,
                            "upstream stream ended without a terminal marker"
                        );
                    }
                }
                state.close();
            }
        }
    }
}

async fn open_upstream(state: &mut StreamState, call: PendingCall) {
    let response = match call
        .transport
        .post_json(&call.url, &call.credential, call.body, true)
        .await
    {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(error = %err, app_id = %call.app_id, "DashScope stream request failed");
            let frames = state.session.error_frames(&err.to_string());
            state.pending.extend(frames);
            state.done = true;
            return;
        }
    };

    let status = response.status();
    if !status.is_success() {
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(err) => bytes::Bytes::from(err.to_string()),
        };
        let message = String::from_utf8_lossy(&body);
        tracing::error!(
            status = status.as_u16(),
            app_id = %call.app_id,
            body = %message,
            "DashScope application stream rejected"
        );
        let frames = state.session.error_frames(&message);
        state.pending.extend(frames);
        state.done = true;
        return;
    }

    state.pending.extend(state.session.opening_frames());
    state.upstream = Some(response.bytes_stream().boxed());
}

impl StreamState {
    fn close(&mut self) {
        self.upstream = None;
        self.done = true;
        let usage = Usage::new(
            self.prompt_tokens,
            count_whitespace_tokens(self.session.answer_text()),
        );
        log_request_complete(&self.model, &usage, true, self.started);
    }
}
