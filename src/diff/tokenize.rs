use std::sync::OnceLock;

use regex::Regex;

fn line_break() -> &'static Regex {
    static LINE_BREAK: OnceLock<Regex> = OnceLock::new();
    LINE_BREAK.get_or_init(|| Regex::new(r"\r\n|\n").expect("line break pattern is valid"))
}

/// Split text into line tokens.
///
/// Line terminators (`\n` or `\r\n`) become tokens of their own, so
/// concatenating the result gives back the input unchanged.
pub fn tokenize_lines(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut last = 0;
    for sep in line_break().find_iter(text) {
        parts.push(&text[last..sep.start()]);
        parts.push(sep.as_str());
        last = sep.end();
    }
    parts.push(&text[last..]);

    // A final terminator leaves an empty trailing piece behind
    if parts.last().map_or(false, |p| p.is_empty()) {
        parts.pop();
    }

    parts.retain(|p| !p.is_empty());
    parts
}

/// Split text into tokens that each hold a whole line including its
/// terminator.
pub fn tokenize_merged_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut last = 0;
    for sep in line_break().find_iter(text) {
        lines.push(&text[last..sep.end()]);
        last = sep.end();
    }
    if last < text.len() {
        lines.push(&text[last..]);
    }
    lines
}

/// Tokenizer selected by [`crate::diff::DiffOptions::newline_is_token`]
pub fn tokenize(text: &str, newline_is_token: bool) -> Vec<&str> {
    if newline_is_token {
        tokenize_lines(text)
    } else {
        tokenize_merged_lines(text)
    }
}
