//! Strips internal reasoning blocks from raw model output.
//!
//! Reasoning models wrap their scratch work in `<think>…</think>`.  Only the
//! text outside those blocks is shown to the user.

use std::ops::Range;

/// Opening reasoning marker (case-sensitive).
pub const OPEN_MARKER: &str = "<think>";
/// Closing reasoning marker (case-sensitive).
pub const CLOSE_MARKER: &str = "</think>";
/// Returned when nothing usable is left after sanitizing.
pub const FALLBACK_REPLY: &str = "I'm not sure how to respond.";

/// Remove every `<think>…</think>` span and trim the result.
///
/// The first opening marker pairs with the next closing marker (no nesting);
/// spans may cross line boundaries.  Removal repeats until no complete pair
/// is left, so the function is idempotent.  An opening marker without a
/// closing partner is kept as-is.  When the remaining text is empty,
/// [`FALLBACK_REPLY`] is returned instead.
///
/// ```
/// use persona_chat::completion::sanitize;
///
/// assert_eq!(sanitize("before<think>hidden</think>after"), "beforeafter");
/// assert_eq!(sanitize("  plain  "), "plain");
/// ```
pub fn sanitize(raw: &str) -> String {
    let mut text = raw.to_string();
    let mut from = 0;
    while let Some(span) = reasoning_span(&text, from) {
        let cut = span.start;
        text.replace_range(span, "");
        // A marker may now straddle the cut; nothing earlier can match.
        from = rewind_to_boundary(&text, cut.saturating_sub(OPEN_MARKER.len() - 1));
    }

    let trimmed = text.trim();
    if trimmed.is_empty() {
        FALLBACK_REPLY.to_string()
    } else {
        trimmed.to_string()
    }
}

/// [`sanitize`] for an optional value; `None` yields [`FALLBACK_REPLY`].
pub fn sanitize_reply(raw: Option<&str>) -> String {
    sanitize(raw.unwrap_or_default())
}

fn reasoning_span(text: &str, from: usize) -> Option<Range<usize>> {
    let start = from + text[from..].find(OPEN_MARKER)?;
    let body = start + OPEN_MARKER.len();
    let close = body + text[body..].find(CLOSE_MARKER)?;
    Some(start..close + CLOSE_MARKER.len())
}

fn rewind_to_boundary(text: &str, mut index: usize) -> usize {
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_inline_block() {
        assert_eq!(sanitize("before<think>hidden</think>after"), "beforeafter");
    }

    #[test]
    fn removes_block_across_lines_and_trims() {
        let raw = "<think>\nstep one\nstep two\n</think>\n\nHello there! 👋\n";
        assert_eq!(sanitize(raw), "Hello there! 👋");
    }

    #[test]
    fn removes_every_block_non_greedily() {
        let raw = "a<think>1</think>b<think>2</think>c";
        assert_eq!(sanitize(raw), "abc");
    }

    #[test]
    fn no_markers_returns_trimmed_input() {
        assert_eq!(sanitize("  just text\n"), "just text");
    }

    #[test]
    fn markers_are_case_sensitive() {
        assert_eq!(sanitize("<THINK>x</THINK>y"), "<THINK>x</THINK>y");
    }

    #[test]
    fn unmatched_open_marker_is_kept() {
        assert_eq!(sanitize("hi <think>never closed"), "hi <think>never closed");
    }

    #[test]
    fn stray_close_marker_is_kept() {
        assert_eq!(sanitize("done</think> ok"), "done</think> ok");
    }

    #[test]
    fn empty_or_blank_input_yields_fallback() {
        assert_eq!(sanitize(""), FALLBACK_REPLY);
        assert_eq!(sanitize(" \n\t "), FALLBACK_REPLY);
    }

    #[test]
    fn reasoning_only_yields_fallback() {
        assert_eq!(sanitize("<think>only thoughts</think>"), FALLBACK_REPLY);
    }

    #[test]
    fn absent_reply_yields_fallback() {
        assert_eq!(sanitize_reply(None), FALLBACK_REPLY);
        assert_eq!(sanitize_reply(Some("<think>x</think>Hello!")), "Hello!");
    }

    #[test]
    fn blocks_revealed_by_removal_are_also_removed() {
        let raw = "x<thi<think>inner</think>nk>outer</think>y";
        assert_eq!(sanitize(raw), "xy");
    }

    #[test]
    fn many_blocks_next_to_multibyte_text() {
        let raw = "👋👋<think>x</think>👋<think>y</think>!".repeat(3);
        assert_eq!(sanitize(&raw), "👋👋👋!".repeat(3));
    }

    #[test]
    fn is_idempotent() {
        let inputs = [
            "",
            "   ",
            "plain",
            "  padded  ",
            "before<think>hidden</think>after",
            "<think>only</think>",
            "a <think>open only",
            "x<thi<think>inner</think>nk>outer</think>y",
            "  <think>a</think>  <think>b</think>  ",
            "</think>stray<think>",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "input: {input:?}");
        }
    }
}
