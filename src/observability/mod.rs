pub mod token_counter;

use tracing_subscriber::EnvFilter;

use crate::protocol::openai_chat::Usage;

/// Initialize the tracing subscriber with the configured log level.
///
/// Maps config log levels to tracing levels:
/// - "DISABLED" -> no subscriber installed
/// - "WARNING" -> WARN
/// - "CRITICAL" -> ERROR
/// - Others map directly (DEBUG, INFO, ERROR)
pub fn init_tracing(log_level: &str) {
    let Some(directive) = tracing_directive(log_level) else {
        return;
    };

    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("INFO"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

fn tracing_directive(log_level: &str) -> Option<String> {
    let level = log_level.to_uppercase();
    match level.as_str() {
        "DISABLED" => None,
        "WARNING" => Some("WARN".to_string()),
        "CRITICAL" => Some("ERROR".to_string()),
        _ => Some(level),
    }
}

/// Log token usage for a completed request, computing duration from start time.
pub fn log_request_complete(
    model: &str,
    usage: &Usage,
    stream: bool,
    start_time: std::time::Instant,
) {
    token_counter::log_request_usage(model, usage, stream, start_time.elapsed());
}

#[cfg(test)]
mod tests {
    use super::tracing_directive;

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(tracing_directive("warning").as_deref(), Some("WARN"));
        assert_eq!(tracing_directive("CRITICAL").as_deref(), Some("ERROR"));
        assert_eq!(tracing_directive("Debug").as_deref(), Some("DEBUG"));
        assert_eq!(tracing_directive("DISABLED"), None);
    }
}
