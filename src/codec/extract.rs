use serde_json::Value;

/// Answer text of an upstream snapshot.
///
/// Tries `output.text`, then `text`, then `output_text`; the first non-empty
/// string wins. Anything else yields `""`.
#[must_use]
pub fn extract_answer_text(obj: &Value) -> &str {
    let Some(map) = obj.as_object() else {
        return "";
    };
    let candidates = [
        map.get("output").and_then(|output| output.get("text")),
        map.get("text"),
        map.get("output_text"),
    ];
    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .find(|text| !text.is_empty())
        .unwrap_or("")
}

/// Reasoning text carried by an upstream snapshot.
///
/// Concatenates the `thought` of every `output.thoughts[]` entry whose
/// `action_type` is `"reasoning"`. The result is cumulative for the snapshot;
/// callers diff successive snapshots themselves.
#[must_use]
pub fn extract_reasoning_delta(obj: &Value) -> String {
    let Some(thoughts) = obj
        .get("output")
        .and_then(|output| output.get("thoughts"))
        .and_then(Value::as_array)
    else {
        return String::new();
    };

    let mut reasoning = String::new();
    for entry in thoughts {
        if entry.get("action_type").and_then(Value::as_str) != Some("reasoning") {
            continue;
        }
        match entry.get("thought") {
            None | Some(Value::Null) => {}
            Some(Value::String(text)) => reasoning.push_str(text),
            Some(Value::Object(map)) => {
                let text = map
                    .get("text")
                    .map(value_text)
                    .filter(|text| !text.is_empty())
                    .or_else(|| map.get("content").map(value_text))
                    .unwrap_or_default();
                reasoning.push_str(&text);
            }
            Some(other) => reasoning.push_str(&other.to_string()),
        }
    }
    reasoning
}

/// Whether a snapshot marks the end of the upstream stream: `finish_reason`
/// of `"stop"` (top level or under `output`) or `is_end == true`.
#[must_use]
pub fn is_terminal_snapshot(obj: &Value) -> bool {
    let finish_reason = obj
        .get("finish_reason")
        .and_then(Value::as_str)
        .or_else(|| {
            obj.get("output")
                .and_then(|output| output.get("finish_reason"))
                .and_then(Value::as_str)
        });
    finish_reason == Some("stop")
        || obj.get("is_end").and_then(Value::as_bool) == Some(true)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
