//! Paragraph normalization for free-text model output.

use once_cell::sync::Lazy;
use regex::Regex;

/// Literal two-character `\n` escape.
static ESCAPED_NEWLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\n").expect("valid escaped-newline pattern"));

static NEWLINE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n+").expect("valid newline-run pattern"));

/// Canonicalize model text into single-newline separated paragraphs.
///
/// Escaped newlines become real ones, runs of newlines collapse to one, and
/// surrounding whitespace is trimmed. `None` yields an empty string.
pub fn normalize(raw: Option<&str>) -> String {
    match raw {
        Some(text) => normalize_str(text),
        None => String::new(),
    }
}

pub fn normalize_str(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let unescaped = ESCAPED_NEWLINE.replace_all(raw, "\n");
    let collapsed = NEWLINE_RUN.replace_all(&unescaped, "\n");
    collapsed.trim().to_string()
}
