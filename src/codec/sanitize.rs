use std::sync::LazyLock;

use regex_lite::Regex;

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("valid code fence pattern"));
static STEP_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Step\s*\d+[:)）\-]?").expect("valid step marker pattern"));
static ENUMERATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\s)\d+[.)]\s*").expect("valid enumerator pattern"));

const ELLIPSIS: &str = "...";

/// Reduce reasoning text to a short, single-line hint.
///
/// Drops fenced code blocks, collapses whitespace, removes `Step N:` and
/// `N.` / `N)` markers, then caps the result at `max_len` characters plus a
/// trailing `"..."`.
#[must_use]
pub fn sanitize_reasoning(text: &str, max_len: usize) -> String {
    if text.is_empty() {
        return String::new();
    }

    let without_code = CODE_FENCE.replace_all(text, "");
    let collapsed = without_code.split_whitespace().collect::<Vec<_>>().join(" ");
    let without_steps = STEP_MARKER.replace_all(&collapsed, "");
    let cleaned = ENUMERATOR.replace_all(&without_steps, "$1");

    match cleaned.char_indices().nth(max_len) {
        Some((cut, _)) => {
            let mut truncated = String::with_capacity(cut + ELLIPSIS.len());
            truncated.push_str(&cleaned[..cut]);
            truncated.push_str(ELLIPSIS);
            truncated
        }
        None => cleaned.into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_code_fences_across_lines() {
        let text = "before ```rust\nfn main() {}\n``` after ```x``` end";
        assert_eq!(sanitize_reasoning(text, 180), "before after end");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(
            sanitize_reasoning("  a\n\n b\t\tc\u{3000}d  ", 180),
            "a b c d"
        );
    }

    #[test]
    fn test_removes_step_markers() {
        assert_eq!(sanitize_reasoning("Step 1: think", 180), " think");
        assert_eq!(sanitize_reasoning("step2) plan", 180), " plan");
        assert_eq!(sanitize_reasoning("STEP 3- go", 180), " go");
    }

    #[test]
    fn test_removes_enumerators() {
        assert_eq!(
            sanitize_reasoning("1. first 2) second 3.third", 180),
            "first second third"
        );
        assert_eq!(sanitize_reasoning("version1.2 stays", 180), "version1.2 stays");
    }

    #[test]
    fn test_truncates_to_exact_length() {
        let text = "a".repeat(500);
        let out = sanitize_reasoning(&text, 180);
        assert_eq!(out.chars().count(), 183);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn test_truncation_counts_characters() {
        let text = "思".repeat(20);
        let out = sanitize_reasoning(&text, 5);
        assert_eq!(out, "思思思思思...");
    }

    #[test]
    fn test_short_text_untouched() {
        assert_eq!(sanitize_reasoning("short", 5), "short");
        assert_eq!(sanitize_reasoning("", 5), "");
    }

    #[test]
    fn test_only_code_yields_empty() {
        assert_eq!(sanitize_reasoning("```secret```", 10), "");
    }
}
