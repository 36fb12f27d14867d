/// Text newly added by `next` relative to the previous cumulative snapshot.
///
/// When `next` extends `prev` the suffix is returned; when it does not (the
/// upstream rewrote earlier text) the whole of `next` counts as new.
#[must_use]
pub fn snapshot_delta<'a>(prev: &str, next: &'a str) -> &'a str {
    next.strip_prefix(prev).unwrap_or(next)
}

/// Tracks one cumulative text channel across upstream snapshots.
#[derive(Debug, Default, Clone)]
pub struct CumulativeText {
    full: String,
}

impl CumulativeText {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `next` as the latest snapshot and return what it added.
    pub fn advance(&mut self, next: &str) -> String {
        let delta = snapshot_delta(&self.full, next).to_owned();
        next.clone_into(&mut self.full);
        delta
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.full
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_yields_suffix() {
        assert_eq!(snapshot_delta("Hello", "Hello world"), " world");
        assert_eq!(snapshot_delta("", "Hello"), "Hello");
        assert_eq!(snapshot_delta("Hello", "Hello"), "");
    }

    #[test]
    fn test_regression_yields_full_value() {
        assert_eq!(snapshot_delta("Hello", "Goodbye"), "Goodbye");
        assert_eq!(snapshot_delta("Hello world", "Hello"), "Hello");
    }

    #[test]
    fn test_multibyte_prefix() {
        assert_eq!(snapshot_delta("你好", "你好，世界"), "，世界");
    }

    #[test]
    fn test_tracker_sequence() {
        let mut answer = CumulativeText::new();
        assert_eq!(answer.advance("Hi"), "Hi");
        assert_eq!(answer.advance("Hi there"), " there");
        assert_eq!(answer.advance("Hi there"), "");
        assert_eq!(answer.advance("Reset"), "Reset");
        assert_eq!(answer.as_str(), "Reset");
    }
}
