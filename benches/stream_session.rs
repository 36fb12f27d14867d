use criterion::{black_box, criterion_group, criterion_main, Criterion};

use dashscope_shim::codec::sanitize_reasoning;
use dashscope_shim::stream::{Frames, StreamSession};

/// Upstream body of cumulative snapshots growing one word at a time.
fn cumulative_body(words: usize, with_thoughts: bool) -> Vec<u8> {
    let mut body = String::new();
    let mut answer = String::new();
    let mut thought = String::new();
    for idx in 0..words {
        if idx > 0 {
            answer.push(' ');
            thought.push(' ');
        }
        answer.push_str("word");
        thought.push_str("Step 1: think");
        body.push_str("data: ");
        let snapshot = if with_thoughts {
            serde_json::json!({
                "output": {
                    "text": answer,
                    "thoughts": [{"action_type": "reasoning", "thought": thought}]
                }
            })
        } else {
            serde_json::json!({"output": {"text": answer}})
        };
        body.push_str(&snapshot.to_string());
        body.push_str("\n\n");
    }
    body.push_str("data: [DONE]\n\n");
    body.into_bytes()
}

fn run_session(body: &[u8], read_size: usize, has_thoughts: bool) -> usize {
    let mut session = StreamSession::new("chatcmpl-bench", "qwen-app", 1_700_000_000, has_thoughts, 180);
    let mut emitted = session.opening_frames().len();
    let mut frames = Frames::new();
    for read in body.chunks(read_size) {
        session.feed_bytes(read, &mut frames);
        emitted += frames.len();
        frames.clear();
    }
    emitted
}

fn bench_stream_session(c: &mut Criterion) {
    let plain = cumulative_body(256, false);
    let thinking = cumulative_body(64, true);

    c.bench_function("stream_session_plain_256_events_single_read", |b| {
        b.iter(|| black_box(run_session(black_box(&plain), plain.len(), false)));
    });

    c.bench_function("stream_session_plain_256_events_64b_reads", |b| {
        b.iter(|| black_box(run_session(black_box(&plain), 64, false)));
    });

    c.bench_function("stream_session_thoughts_64_events_256b_reads", |b| {
        b.iter(|| black_box(run_session(black_box(&thinking), 256, true)));
    });
}

fn bench_sanitize_reasoning(c: &mut Criterion) {
    let text = "Step 1: read the question.\n```python\nprint(1)\n```\n2) compare values ".repeat(16);
    c.bench_function("sanitize_reasoning_1k", |b| {
        b.iter(|| black_box(sanitize_reasoning(black_box(&text), 180)));
    });
}

criterion_group!(benches, bench_stream_session, bench_sanitize_reasoning);
criterion_main!(benches);
