use serde_json::Value;

use crate::protocol::openai_chat::ChatMessage;

/// Flatten chat messages into the single prompt string an application
/// completion accepts: one `"{role}: {content}"` line per message.
#[must_use]
pub fn messages_to_prompt(messages: &[ChatMessage]) -> String {
    let mut prompt = String::new();
    for (idx, message) in messages.iter().enumerate() {
        if idx > 0 {
            prompt.push('\n');
        }
        prompt.push_str(message.role.as_str());
        prompt.push_str(": ");
        flatten_content_into(message.content.as_ref(), &mut prompt);
    }
    prompt
}

/// Flatten one message `content` value to plain text.
#[must_use]
pub fn flatten_content(content: Option<&Value>) -> String {
    let mut out = String::new();
    flatten_content_into(content, &mut out);
    out
}

fn flatten_content_into(content: Option<&Value>, out: &mut String) {
    match content {
        None | Some(Value::Null) => {}
        Some(Value::String(text)) => out.push_str(text),
        Some(Value::Array(parts)) => {
            for part in parts {
                push_part_text(part, out);
            }
        }
        Some(other) => out.push_str(&other.to_string()),
    }
}

// Parts carrying a `text` key contribute it; typed text parts without one and
// every other shape contribute nothing.
fn push_part_text(part: &Value, out: &mut String) {
    let Some(map) = part.as_object() else {
        return;
    };
    match map.get("text") {
        Some(Value::String(text)) => out.push_str(text),
        Some(Value::Null) | None => {}
        Some(other) => out.push_str(&other.to_string()),
    }
}
