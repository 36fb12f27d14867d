//! Pure conversions between chat messages, upstream JSON snapshots and the
//! text that flows through the translator. Nothing in here performs I/O or
//! fails: malformed input degrades to empty text.

mod extract;
mod prompt;
mod sanitize;

pub use extract::{extract_answer_text, extract_reasoning_delta, is_terminal_snapshot};
pub use prompt::{flatten_content, messages_to_prompt};
pub use sanitize::sanitize_reasoning;
