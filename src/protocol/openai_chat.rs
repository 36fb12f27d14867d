use std::fmt;

use serde::{Deserialize, Serialize};

use crate::util::{push_json_string_escaped, push_u64_decimal};

pub const CHAT_COMPLETION_OBJECT: &str = "chat.completion";
pub const CHAT_COMPLETION_CHUNK_OBJECT: &str = "chat.completion.chunk";
pub const FINISH_REASON_STOP: &str = "stop";

/// Message author role accepted on the chat-completions surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Function,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Function => "function",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound chat message.
///
/// `content` stays an untyped JSON value: clients send a plain string, a list
/// of content parts, `null`, or occasionally a bare scalar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<serde_json::Map<String, serde_json::Value>>,
}

impl ChatMessage {
    #[must_use]
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(serde_json::Value::String(content.into())),
            name: None,
            function_call: None,
        }
    }
}

/// `stop` field in chat requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StopSequences {
    Single(String),
    Multi(Vec<String>),
}

/// Chat completion request wire type.
///
/// Unknown fields are kept in `extra`; provider switches such as
/// `has_thoughts`, `enable_thinking` and `incremental_output` arrive there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<StopSequences>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logit_bias: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ChatCompletionRequest {
    /// Minimal request with only `model` and `messages` set.
    #[must_use]
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            top_p: None,
            n: None,
            stream: None,
            stop: None,
            max_tokens: None,
            presence_penalty: None,
            frequency_penalty: None,
            logit_bias: None,
            user: None,
            seed: None,
            tools: None,
            tool_choice: None,
            response_format: None,
            reasoning_effort: None,
            extra: serde_json::Map::new(),
        }
    }

    #[must_use]
    pub fn is_stream(&self) -> bool {
        self.stream.unwrap_or(false)
    }

    /// Boolean provider switch carried as an unrecognized field.
    #[must_use]
    pub fn extra_bool(&self, key: &str) -> Option<bool> {
        self.extra.get(key).and_then(serde_json::Value::as_bool)
    }
}

/// Assistant message in a non-streaming response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
}

/// A single choice in the response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

/// Usage info in the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl Usage {
    #[must_use]
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Chat completion response wire type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Usage,
}

/// Delta content within a stream choice. An all-`None` delta serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
}

/// A choice within a stream chunk. `finish_reason` is always present on the
/// wire, `null` until the terminal chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: ChunkDelta,
    pub finish_reason: Option<String>,
}

/// A streaming chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
}

/// Entry of the `/v1/models` listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelObject {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub owned_by: String,
    pub permission: Vec<serde_json::Value>,
    pub root: String,
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `/v1/models` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelList {
    pub object: String,
    pub data: Vec<ModelObject>,
}

// ---------------------------------------------------------------------------
// Streaming chunk frames
// ---------------------------------------------------------------------------

/// Encodes `chat.completion.chunk` SSE frames for one stream.
///
/// The `id`/`object`/`created`/`model` prefix is identical for every chunk of
/// a stream, so it is rendered once up front.
#[derive(Debug, Clone)]
pub struct ChunkFrameEncoder {
    prefix: String,
}

impl ChunkFrameEncoder {
    #[must_use]
    pub fn new(id: &str, model: &str, created: u64) -> Self {
        let mut prefix = String::with_capacity(80 + id.len() + model.len());
        prefix.push_str("data: {\"id\":");
        push_json_string_escaped(&mut prefix, id);
        prefix.push_str(",\"object\":\"");
        prefix.push_str(CHAT_COMPLETION_CHUNK_OBJECT);
        prefix.push_str("\",\"created\":");
        push_u64_decimal(&mut prefix, created);
        prefix.push_str(",\"model\":");
        push_json_string_escaped(&mut prefix, model);
        prefix.push_str(",\"choices\":[{\"index\":0,\"delta\":");
        Self { prefix }
    }

    /// `delta={role:"assistant"}`, stream still open.
    #[must_use]
    pub fn role(&self) -> String {
        let mut out = self.start(32);
        out.push_str("{\"role\":\"assistant\"}");
        Self::finish_open(out)
    }

    #[must_use]
    pub fn content(&self, text: &str) -> String {
        self.single_field("content", text)
    }

    #[must_use]
    pub fn reasoning(&self, text: &str) -> String {
        self.single_field("reasoning_content", text)
    }

    /// Terminal chunk: empty delta with `finish_reason="stop"`.
    #[must_use]
    pub fn stop(&self) -> String {
        let mut out = self.start(40);
        out.push_str("{},\"finish_reason\":\"");
        out.push_str(FINISH_REASON_STOP);
        out.push_str("\"}]}\n\n");
        out
    }

    /// In-band failure report: assistant role plus `Error: <message>` content,
    /// already finished.
    #[must_use]
    pub fn error(&self, message: &str) -> String {
        let mut out = self.start(72 + message.len());
        out.push_str("{\"role\":\"assistant\",\"content\":");
        let mut text = String::with_capacity(7 + message.len());
        text.push_str("Error: ");
        text.push_str(message);
        push_json_string_escaped(&mut out, &text);
        out.push_str("},\"finish_reason\":\"");
        out.push_str(FINISH_REASON_STOP);
        out.push_str("\"}]}\n\n");
        out
    }

    fn single_field(&self, field: &str, text: &str) -> String {
        let mut out = self.start(32 + field.len() + text.len());
        out.push_str("{\"");
        out.push_str(field);
        out.push_str("\":");
        push_json_string_escaped(&mut out, text);
        out.push('}');
        Self::finish_open(out)
    }

    fn start(&self, extra: usize) -> String {
        let mut out = String::with_capacity(self.prefix.len() + extra + 32);
        out.push_str(&self.prefix);
        out
    }

    fn finish_open(mut out: String) -> String {
        out.push_str(",\"finish_reason\":null}]}\n\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_keeps_unknown_fields() {
        let req: ChatCompletionRequest = serde_json::from_str(
            r#"{"model":"m","messages":[{"role":"user","content":"hi"}],"has_thoughts":true,"enable_thinking":false,"custom":{"a":1}}"#,
        )
        .unwrap();
        assert_eq!(req.extra_bool("has_thoughts"), Some(true));
        assert_eq!(req.extra_bool("enable_thinking"), Some(false));
        assert_eq!(req.extra_bool("incremental_output"), None);
        assert!(req.extra.contains_key("custom"));
        assert!(!req.is_stream());
        assert!(req.reasoning_effort.is_none());
    }

    #[test]
    fn test_request_accepts_content_parts_and_null() {
        let req: ChatCompletionRequest = serde_json::from_str(
            r#"{"model":"m","stream":true,"messages":[
                {"role":"system","content":null},
                {"role":"user","content":[{"type":"text","text":"a"}]},
                {"role":"function","name":"f","content":"r"}
            ],"stop":["x","y"],"reasoning_effort":"HIGH"}"#,
        )
        .unwrap();
        assert!(req.is_stream());
        assert_eq!(req.messages.len(), 3);
        assert!(req.messages[0].content.as_ref().unwrap().is_null());
        assert_eq!(req.messages[2].role, Role::Function);
        assert!(matches!(req.stop, Some(StopSequences::Multi(ref v)) if v.len() == 2));
        assert_eq!(req.reasoning_effort.as_deref(), Some("HIGH"));
    }

    #[test]
    fn test_request_rejects_unknown_role() {
        let parsed = serde_json::from_str::<ChatCompletionRequest>(
            r#"{"model":"m","messages":[{"role":"robot","content":"x"}]}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_empty_delta_serializes_as_empty_object() {
        let chunk = ChunkChoice {
            index: 0,
            delta: ChunkDelta::default(),
            finish_reason: Some(FINISH_REASON_STOP.to_string()),
        };
        let json = serde_json::to_value(&chunk).unwrap();
        assert_eq!(json["delta"], serde_json::json!({}));
        assert_eq!(json["finish_reason"], "stop");
    }

    #[test]
    fn test_open_choice_serializes_null_finish_reason() {
        let chunk = ChunkChoice {
            index: 0,
            delta: ChunkDelta {
                role: Some(Role::Assistant),
                ..ChunkDelta::default()
            },
            finish_reason: None,
        };
        let json = serde_json::to_value(&chunk).unwrap();
        assert_eq!(json["delta"], serde_json::json!({"role": "assistant"}));
        assert!(json["finish_reason"].is_null());
    }

    #[test]
    fn test_usage_total_is_sum() {
        let usage = Usage::new(7, 5);
        assert_eq!(usage.total_tokens, 12);
    }

    fn decode_frame(frame: &str) -> ChatCompletionChunk {
        let json = frame
            .strip_prefix("data: ")
            .and_then(|rest| rest.strip_suffix("\n\n"))
            .expect("sse framing");
        serde_json::from_str(json).expect("chunk json")
    }

    #[test]
    fn test_chunk_encoder_role_and_content() {
        let encoder = ChunkFrameEncoder::new("chatcmpl-1", "m\"x", 1_700_000_000);
        let role = decode_frame(&encoder.role());
        assert_eq!(role.id, "chatcmpl-1");
        assert_eq!(role.object, CHAT_COMPLETION_CHUNK_OBJECT);
        assert_eq!(role.created, 1_700_000_000);
        assert_eq!(role.model, "m\"x");
        assert_eq!(role.choices[0].delta.role, Some(Role::Assistant));
        assert!(role.choices[0].finish_reason.is_none());

        let content = decode_frame(&encoder.content("line\n\"q\""));
        assert_eq!(content.choices[0].delta.content.as_deref(), Some("line\n\"q\""));
        assert!(content.choices[0].delta.role.is_none());
    }

    #[test]
    fn test_chunk_encoder_reasoning_keeps_non_ascii() {
        let encoder = ChunkFrameEncoder::new("id", "m", 1);
        let frame = encoder.reasoning("正在思考...");
        assert!(frame.contains("正在思考..."));
        let chunk = decode_frame(&frame);
        assert_eq!(
            chunk.choices[0].delta.reasoning_content.as_deref(),
            Some("正在思考...")
        );
    }

    #[test]
    fn test_chunk_encoder_stop_has_empty_delta() {
        let encoder = ChunkFrameEncoder::new("id", "m", 1);
        let frame = encoder.stop();
        assert!(frame.contains("\"delta\":{},\"finish_reason\":\"stop\""));
        let chunk = decode_frame(&frame);
        assert_eq!(chunk.choices[0].delta, ChunkDelta::default());
    }

    #[test]
    fn test_chunk_encoder_error_frame() {
        let encoder = ChunkFrameEncoder::new("id", "m", 1);
        let chunk = decode_frame(&encoder.error("{\"code\":\"InvalidApiKey\"}"));
        assert_eq!(chunk.choices[0].delta.role, Some(Role::Assistant));
        assert_eq!(
            chunk.choices[0].delta.content.as_deref(),
            Some("Error: {\"code\":\"InvalidApiKey\"}")
        );
        assert_eq!(chunk.choices[0].finish_reason.as_deref(), Some("stop"));
    }
}
