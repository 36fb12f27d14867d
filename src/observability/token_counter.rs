use std::time::Duration;

use tracing::info;

use crate::protocol::openai_chat::Usage;

/// Token estimate used for reported usage: the number of whitespace
/// separated words.
#[must_use]
pub fn count_whitespace_tokens(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

/// Usage block for a prompt/answer pair. `total_tokens` is always the sum of
/// the two counts.
#[must_use]
pub fn estimate_usage(prompt: &str, answer: &str) -> Usage {
    Usage::new(count_whitespace_tokens(prompt), count_whitespace_tokens(answer))
}

/// Log token usage for a completed request at INFO level.
pub fn log_request_usage(model: &str, usage: &Usage, stream: bool, duration: Duration) {
    info!(
        model = model,
        stream,
        prompt_tokens = usage.prompt_tokens,
        completion_tokens = usage.completion_tokens,
        total_tokens = usage.total_tokens,
        duration_seconds = duration.as_secs_f64(),
        "request completed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_tokens() {
        assert_eq!(count_whitespace_tokens(""), 0);
        assert_eq!(count_whitespace_tokens("   "), 0);
        assert_eq!(count_whitespace_tokens("user: hi there"), 3);
        assert_eq!(count_whitespace_tokens("a\n\tb  c"), 3);
    }

    #[test]
    fn test_estimate_usage_total_is_sum() {
        let usage = estimate_usage("system: be brief\nuser: hello", "Hello!");
        assert_eq!(usage.prompt_tokens, 5);
        assert_eq!(usage.completion_tokens, 1);
        assert_eq!(usage.total_tokens, 6);
    }
}
