//! Streaming re-framing: upstream SSE events in, OpenAI chunk frames out.

pub mod delta;
pub mod session;
pub mod sse;

pub use delta::{snapshot_delta, CumulativeText};
pub use session::{Frames, SessionState, StreamSession, REASONING_PLACEHOLDER};
pub use sse::{done_frame, is_done_data, SseEventBuffer, Utf8Carry};
