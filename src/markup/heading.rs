//! Markdown heading extraction

use crate::model::Heading;
use regex::Regex;
use std::sync::LazyLock;

/// A `#`-prefixed line together with its trailing newline
pub static HEADING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?P<level>#{1,6}) +(?P<text>.*)$\n?").expect("valid heading regex")
});

/// Collects the headings of `text` in document order
///
/// Headings whose text is blank are skipped; `order` counts the remaining
/// headings from zero.
pub fn extract_headings(text: &str) -> Vec<Heading> {
    HEADING_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            let level = caps.name("level").map_or(1, |m| m.as_str().len());
            let text = caps.name("text").map_or("", |m| m.as_str()).trim_end_matches('\r');
            (!text.trim().is_empty()).then(|| (level, text.to_string()))
        })
        .enumerate()
        .map(|(order, (level, text))| Heading {
            text,
            level: level as u8,
            order,
        })
        .collect()
}

/// Removes heading lines together with their trailing newline
///
/// The line before a heading keeps its own newline, so the text on either
/// side stays on separate lines.
pub fn remove_headings(text: &str) -> String {
    HEADING_PATTERN.replace_all(text, "").into_owned()
}
