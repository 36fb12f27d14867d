/// SSE (Server-Sent Events) framing for upstream bodies and outbound frames.
///
/// Upstream bytes are buffered until a blank-line delimiter arrives; only
/// complete events are ever handed out, so a JSON payload split across
/// network reads is never seen half-written.
use memchr::memmem;
use std::sync::LazyLock;

const DONE_FRAME: &str = "data: [DONE]\n\n";
const DONE_MARKER: &str = "[DONE]";
const COMPACT_THRESHOLD_BYTES: usize = 8 * 1024;

// ---------------------------------------------------------------------------
// SseEventBuffer — delimiter-based event framing
// ---------------------------------------------------------------------------

/// Incremental SSE event splitter.
///
/// Feed it decoded text in arbitrary pieces and pull the `data:` payload of
/// each complete event. Events end at `\n\n` or `\r\n\r\n`; an event without
/// its delimiter stays buffered.
#[derive(Debug, Default)]
pub struct SseEventBuffer {
    buffer: String,
    read_offset: usize,
}

impl SseEventBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append decoded text from the wire.
    pub fn push_str(&mut self, chunk: &str) {
        self.buffer.push_str(chunk);
    }

    /// Pop the next complete event that carries `data:` lines.
    ///
    /// The payload is every `data:` line with the prefix and its following
    /// whitespace stripped, joined by `\n`, then trimmed. Events without data
    /// lines (comments, bare `event:`/`id:` fields) are consumed and skipped.
    pub fn next_data(&mut self) -> Option<String> {
        loop {
            let pending = &self.buffer.as_bytes()[self.read_offset..];
            let (frame_start, frame_len) = find_sse_frame_terminator(pending)?;
            let event_start = self.read_offset;
            let event_end = event_start + frame_start;
            self.read_offset = event_end + frame_len;

            let data = collect_data_lines(&self.buffer[event_start..event_end]);
            self.compact();
            if let Some(data) = data {
                return Some(data);
            }
        }
    }

    fn compact(&mut self) {
        if self.read_offset == self.buffer.len() {
            self.buffer.clear();
            self.read_offset = 0;
            return;
        }
        let should_compact = self.read_offset > 0
            && (self.read_offset >= self.buffer.len() / 2
                || self.read_offset >= COMPACT_THRESHOLD_BYTES);
        if should_compact {
            self.buffer.drain(..self.read_offset);
            self.read_offset = 0;
        }
    }
}

fn collect_data_lines(event: &str) -> Option<String> {
    let mut data: Option<String> = None;
    for line in event.lines() {
        let Some(value) = line.strip_prefix("data:") else {
            continue;
        };
        let value = value.trim_start();
        match data.as_mut() {
            Some(joined) => {
                joined.push('\n');
                joined.push_str(value);
            }
            None => data = Some(value.to_owned()),
        }
    }
    data.map(|joined| {
        let trimmed = joined.trim();
        if trimmed.len() == joined.len() {
            joined
        } else {
            trimmed.to_owned()
        }
    })
}

#[inline]
fn find_sse_frame_terminator(buffer: &[u8]) -> Option<(usize, usize)> {
    static LF_LF_FINDER: LazyLock<memmem::Finder<'static>> =
        LazyLock::new(|| memmem::Finder::new(b"\n\n"));
    static CRLF_CRLF_FINDER: LazyLock<memmem::Finder<'static>> =
        LazyLock::new(|| memmem::Finder::new(b"\r\n\r\n"));

    let lf_lf_pos = LF_LF_FINDER.find(buffer);
    let crlf_crlf_pos = CRLF_CRLF_FINDER.find(buffer);

    match (lf_lf_pos, crlf_crlf_pos) {
        (Some(lf_pos), Some(crlf_pos)) => {
            if lf_pos <= crlf_pos {
                Some((lf_pos, 2))
            } else {
                Some((crlf_pos, 4))
            }
        }
        (Some(lf_pos), None) => Some((lf_pos, 2)),
        (None, Some(crlf_pos)) => Some((crlf_pos, 4)),
        (None, None) => None,
    }
}

// ---------------------------------------------------------------------------
// Utf8Carry — byte chunks to text without splitting code points
// ---------------------------------------------------------------------------

/// Decodes network byte chunks to UTF-8 text, holding back an incomplete
/// trailing sequence until the next chunk completes it. Invalid sequences
/// decode to U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Carry {
    remainder: Vec<u8>,
}

impl Utf8Carry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes` (prefixed by any carried bytes) and append to `out`.
    pub fn decode_into(&mut self, bytes: &[u8], out: &mut String) {
        if self.remainder.is_empty() {
            let rest = decode_valid_prefix(bytes, out);
            self.remainder.extend_from_slice(rest);
        } else {
            let mut joined = std::mem::take(&mut self.remainder);
            joined.extend_from_slice(bytes);
            let rest = decode_valid_prefix(&joined, out);
            self.remainder.extend_from_slice(rest);
        }
    }
}

fn decode_valid_prefix<'a>(mut bytes: &'a [u8], out: &mut String) -> &'a [u8] {
    loop {
        match std::str::from_utf8(bytes) {
            Ok(text) => {
                out.push_str(text);
                return &[];
            }
            Err(err) => {
                let (valid, after_valid) = bytes.split_at(err.valid_up_to());
                if let Ok(text) = std::str::from_utf8(valid) {
                    out.push_str(text);
                }
                match err.error_len() {
                    Some(invalid_len) => {
                        out.push(char::REPLACEMENT_CHARACTER);
                        bytes = &after_valid[invalid_len..];
                    }
                    None => return after_valid,
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Encoding helpers
// ---------------------------------------------------------------------------

/// Check whether an event payload is the `[DONE]` sentinel.
#[must_use]
pub fn is_done_data(data: &str) -> bool {
    data.trim() == DONE_MARKER
}

/// Format a `[DONE]` frame as SSE text.
#[must_use]
pub fn done_frame() -> String {
    DONE_FRAME.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(buffer: &mut SseEventBuffer) -> Vec<String> {
        std::iter::from_fn(|| buffer.next_data()).collect()
    }

    #[test]
    fn test_simple_data_event() {
        let mut buffer = SseEventBuffer::new();
        buffer.push_str("data: hello world\n\n");
        assert_eq!(drain(&mut buffer), vec!["hello world"]);
        assert_eq!(&buffer.buffer[buffer.read_offset..], "");
    }

    #[test]
    fn test_dashscope_event_fields_are_ignored() {
        let mut buffer = SseEventBuffer::new();
        buffer.push_str("id:1\nevent:result\n:HTTP_STATUS/200\ndata:{\"output\":{\"text\":\"Hi\"}}\n\n");
        assert_eq!(drain(&mut buffer), vec!["{\"output\":{\"text\":\"Hi\"}}"]);
    }

    #[test]
    fn test_multiline_data_joined_and_trimmed() {
        let mut buffer = SseEventBuffer::new();
        buffer.push_str("data:   line1  \ndata:\tline2\ndata: \n\n");
        assert_eq!(drain(&mut buffer), vec!["line1  \nline2"]);
    }

    #[test]
    fn test_event_without_data_is_skipped() {
        let mut buffer = SseEventBuffer::new();
        buffer.push_str(": keepalive\n\nevent: ping\n\ndata: real\n\n");
        assert_eq!(drain(&mut buffer), vec!["real"]);
    }

    #[test]
    fn test_partial_event_stays_buffered() {
        let mut buffer = SseEventBuffer::new();
        buffer.push_str("data: {\"te");
        assert!(buffer.next_data().is_none());
        buffer.push_str("xt\":\"x\"}\n");
        assert!(buffer.next_data().is_none());
        assert_eq!(&buffer.buffer[buffer.read_offset..], "data: {\"text\":\"x\"}\n");
        buffer.push_str("\ndata: next");
        assert_eq!(drain(&mut buffer), vec!["{\"text\":\"x\"}"]);
        assert_eq!(&buffer.buffer[buffer.read_offset..], "data: next");
    }

    #[test]
    fn test_crlf_delimiters() {
        let mut buffer = SseEventBuffer::new();
        buffer.push_str("data: a\r\n\r\ndata: b\n\n");
        assert_eq!(drain(&mut buffer), vec!["a", "b"]);
    }

    #[test]
    fn test_byte_by_byte_matches_single_feed() {
        let input = "data: first\n\n: c\n\ndata: {\"k\":1}\ndata: 2\n\ndata: [DONE]\n\n";
        let mut whole = SseEventBuffer::new();
        whole.push_str(input);
        let expected = drain(&mut whole);

        let mut pieces = SseEventBuffer::new();
        let mut got = Vec::new();
        for ch in input.chars() {
            let mut tmp = [0u8; 4];
            pieces.push_str(ch.encode_utf8(&mut tmp));
            got.extend(drain(&mut pieces));
        }
        assert_eq!(got, expected);
        assert_eq!(expected.len(), 3);
        assert!(is_done_data(&expected[2]));
    }

    #[test]
    fn test_utf8_carry_across_chunks() {
        let bytes = "你好".as_bytes();
        let mut carry = Utf8Carry::new();
        let mut out = String::new();
        carry.decode_into(&bytes[..2], &mut out);
        assert_eq!(out, "");
        assert!(!carry.remainder.is_empty());
        carry.decode_into(&bytes[2..4], &mut out);
        assert_eq!(out, "你");
        carry.decode_into(&bytes[4..], &mut out);
        assert_eq!(out, "你好");
        assert!(carry.remainder.is_empty());
    }

    #[test]
    fn test_utf8_invalid_byte_replaced() {
        let mut carry = Utf8Carry::new();
        let mut out = String::new();
        carry.decode_into(b"a\xffb", &mut out);
        assert_eq!(out, "a\u{fffd}b");
        assert!(carry.remainder.is_empty());
    }

    #[test]
    fn test_done_frame_string() {
        assert_eq!(done_frame(), "data: [DONE]\n\n");
        assert!(is_done_data(" [DONE] "));
        assert!(!is_done_data("{\"content\":\"hello\"}"));
    }
}
