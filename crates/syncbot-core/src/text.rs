//! Character-based truncation used by record bodies and chat excerpts.
//!
//! Lengths count Unicode scalar values, never bytes, so multi-byte text is
//! never split inside a character.

/// Maximum body length copied into a database record.
pub const RECORD_BODY_LIMIT: usize = 2000;

/// Maximum body length shown in a chat excerpt.
pub const EXCERPT_LIMIT: usize = 300;

/// Appended to excerpts that were cut.
pub const ELLIPSIS: &str = "...";

/// The first `max` characters of `s`.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// First [`EXCERPT_LIMIT`] characters, with [`ELLIPSIS`] only when text was cut.
pub fn excerpt(s: &str) -> String {
    let head = truncate_chars(s, EXCERPT_LIMIT);
    if head.len() < s.len() {
        format!("{head}{ELLIPSIS}")
    } else {
        s.to_string()
    }
}

/// Wrap text in a Slack preformatted block.
pub fn code_block(s: &str) -> String {
    format!("```{s}```")
}

/// `items` joined by `", "`, or `empty` when there are none.
pub fn join_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}
