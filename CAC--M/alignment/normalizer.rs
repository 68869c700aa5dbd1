use once_cell::sync::Lazy;
use regex::Regex;

static ESCAPED_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\\r)?\\n").expect("escaped break pattern compiles"));
static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern compiles"));

/// Cleans a raw table cell.
///
/// Missing cells become the empty string. Literal `\n` and `\r\n` escape
/// sequences (as exported by spreadsheet tools) and runs of real whitespace
/// collapse to a single space, and the result is trimmed. Other backslash
/// sequences and case are preserved.
#[must_use]
pub fn normalize(text: Option<&str>) -> String {
    let Some(raw) = text else {
        return String::new();
    };
    if raw.is_empty() {
        return String::new();
    }
    let unescaped = ESCAPED_BREAK.replace_all(raw, " ");
    WHITESPACE
        .replace_all(&unescaped, " ")
        .trim()
        .to_string()
}
