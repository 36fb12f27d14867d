use smallvec::SmallVec;

use crate::codec::{
    extract_answer_text, extract_reasoning_delta, is_terminal_snapshot, sanitize_reasoning,
};
use crate::error::ShimError;
use crate::protocol::openai_chat::ChunkFrameEncoder;
use crate::stream::delta::CumulativeText;
use crate::stream::sse::{done_frame, is_done_data, SseEventBuffer, Utf8Carry};

/// Reasoning text announced before the upstream has produced any.
pub const REASONING_PLACEHOLDER: &str = "正在思考...";

/// Outbound SSE frames produced by one step of the session.
pub type Frames = SmallVec<[String; 4]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Finished,
}

/// Re-framing state for one streaming completion.
///
/// Upstream bytes go in through [`StreamSession::feed_bytes`]; OpenAI chunk
/// frames come out. Once a terminal signal has been seen the session is
/// `Finished` and ignores further input.
#[derive(Debug)]
pub struct StreamSession {
    encoder: ChunkFrameEncoder,
    has_thoughts: bool,
    reasoning_max_len: usize,
    utf8: Utf8Carry,
    events: SseEventBuffer,
    text: String,
    answer: CumulativeText,
    reasoning: CumulativeText,
    state: SessionState,
}

impl StreamSession {
    #[must_use]
    pub fn new(
        chat_id: &str,
        model: &str,
        created: u64,
        has_thoughts: bool,
        reasoning_max_len: usize,
    ) -> Self {
        Self {
            encoder: ChunkFrameEncoder::new(chat_id, model, created),
            has_thoughts,
            reasoning_max_len,
            utf8: Utf8Carry::new(),
            events: SseEventBuffer::new(),
            text: String::new(),
            answer: CumulativeText::new(),
            reasoning: CumulativeText::new(),
            state: SessionState::Open,
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state == SessionState::Finished
    }

    /// Frames sent as soon as the upstream accepted the request: the role
    /// announcement, then the reasoning placeholder when thoughts are on.
    #[must_use]
    pub fn opening_frames(&self) -> Frames {
        let mut frames = Frames::new();
        frames.push(self.encoder.role());
        if self.has_thoughts {
            frames.push(self.encoder.reasoning(REASONING_PLACEHOLDER));
        }
        frames
    }

    /// Feed raw upstream bytes. Split UTF-8 sequences are carried over.
    pub fn feed_bytes(&mut self, bytes: &[u8], out: &mut Frames) -> SessionState {
        if self.is_finished() {
            return self.state;
        }
        let mut text = std::mem::take(&mut self.text);
        text.clear();
        self.utf8.decode_into(bytes, &mut text);
        let state = self.feed(&text, out);
        self.text = text;
        state
    }

    /// Feed decoded upstream text and append every resulting frame to `out`.
    pub fn feed(&mut self, text: &str, out: &mut Frames) -> SessionState {
        if self.is_finished() {
            return self.state;
        }
        self.events.push_str(text);
        while let Some(data) = self.events.next_data() {
            if self.handle_event(&data, out) == SessionState::Finished {
                break;
            }
        }
        self.state
    }

    /// Terminal chunk followed by `[DONE]`; marks the session finished.
    pub fn finish_frames(&mut self) -> Frames {
        let mut frames = Frames::new();
        self.finish_into(&mut frames);
        frames
    }

    /// Error chunk followed by `[DONE]`, for an upstream that rejected the
    /// request before streaming anything.
    pub fn error_frames(&mut self, message: &str) -> Frames {
        self.state = SessionState::Finished;
        let mut frames = Frames::new();
        frames.push(self.encoder.error(message));
        frames.push(done_frame());
        frames
    }

    /// Cumulative answer text seen so far.
    #[must_use]
    pub fn answer_text(&self) -> &str {
        self.answer.as_str()
    }

    fn handle_event(&mut self, data: &str, out: &mut Frames) -> SessionState {
        if is_done_data(data) {
            self.finish_into(out);
            return self.state;
        }

        let snapshot: serde_json::Value = match serde_json::from_str(data) {
            Ok(value) => value,
            Err(err) => {
                let err = ShimError::MalformedFrame(err.to_string());
                tracing::warn!(error = %err, "skipping upstream SSE event");
                return self.state;
            }
        };

        if self.has_thoughts {
            let reasoning_full = extract_reasoning_delta(&snapshot);
            if !reasoning_full.is_empty() {
                let delta = self.reasoning.advance(&reasoning_full);
                let safe = sanitize_reasoning(&delta, self.reasoning_max_len);
                if !safe.is_empty() {
                    out.push(self.encoder.reasoning(&safe));
                }
            }
        }

        let answer_full = extract_answer_text(&snapshot);
        if !answer_full.is_empty() {
            let delta = self.answer.advance(answer_full);
            if !delta.is_empty() {
                out.push(self.encoder.content(&delta));
            }
        }

        if is_terminal_snapshot(&snapshot) {
            self.finish_into(out);
        }
        self.state
    }

    fn finish_into(&mut self, out: &mut Frames) {
        if self.is_finished() {
            return;
        }
        self.state = SessionState::Finished;
        out.push(self.encoder.stop());
        out.push(done_frame());
    }
}
