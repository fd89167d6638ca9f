//! Text cleanup helpers for extracted page content

use regex::Regex;
use std::sync::LazyLock;

static PARAGRAPH_DELIMITER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("valid paragraph regex"));

/// Maps exotic Unicode spaces to a plain space and drops zero-width characters
pub fn normalize_whitespace(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\u{00A0}' | '\u{2000}'..='\u{200A}' | '\u{202F}' | '\u{205F}' | '\u{3000}' => {
                Some(' ')
            }
            '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}' => None,
            c => Some(c),
        })
        .collect()
}

/// Splits text on blank lines into trimmed, non-empty paragraphs
pub fn split_paragraphs(text: &str) -> Vec<String> {
    PARAGRAPH_DELIMITER
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
