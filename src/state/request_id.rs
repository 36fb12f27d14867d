use std::sync::atomic::{AtomicU64, Ordering};

use crate::util::format_hex_id;

const CHAT_ID_PREFIX: &str = "chatcmpl-";

/// Per-process identifier source: a random seed mixed with a sequence number.
#[derive(Debug)]
pub(crate) struct RequestIdGenerator {
    seed: u64,
    counter: AtomicU64,
}

impl RequestIdGenerator {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::with_seed(fastrand::u64(..))
    }

    #[must_use]
    pub(crate) fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            counter: AtomicU64::new(1),
        }
    }

    pub(crate) fn next_seq(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::Relaxed)
    }

    /// `chatcmpl-` followed by 16 hex digits, unique within the process.
    #[must_use]
    pub(crate) fn chat_id(&self, request_seq: u64) -> String {
        format_hex_id(CHAT_ID_PREFIX, self.seed ^ request_seq)
    }

    #[must_use]
    pub(crate) fn next_chat_id(&self) -> String {
        self.chat_id(self.next_seq())
    }

    /// Correlation id for log lines of one inbound request.
    #[must_use]
    pub(crate) fn request_uuid(&self, request_seq: u64) -> uuid::Uuid {
        uuid::Uuid::from_u64_pair(self.seed, request_seq)
    }
}
