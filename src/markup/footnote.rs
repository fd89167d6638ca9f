//! Footnote label extraction and re-injection
//!
//! Labels look like `[1]`, `[note]` or `[*]`, optionally preceded by one or
//! two escaping backslashes left behind by markdown conversion.

use crate::model::{Footnote, SentenceFootnote};
use regex::Regex;
use std::sync::LazyLock;

pub static FOOTNOTE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\?\\?\[(?P<label>[a-zA-Z0-9*]+)\]").expect("valid footnote regex")
});

/// A footnote label and where it sits in label-free text
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FootnoteMark {
    pub label: String,
    pub position: usize,
}

impl From<&Footnote> for FootnoteMark {
    fn from(note: &Footnote) -> Self {
        Self {
            label: note.label.clone(),
            position: note.position,
        }
    }
}

impl From<&SentenceFootnote> for FootnoteMark {
    fn from(note: &SentenceFootnote) -> Self {
        Self {
            label: note.label.clone(),
            position: note.position,
        }
    }
}

/// Default label format: `[label]`
pub fn format_label(label: &str) -> String {
    format!("[{label}]")
}

/// Finds every footnote label in `text`
///
/// Each position is the character offset the label would occupy once all
/// labels have been removed, so the marks line up with the output of
/// [`remove_footnote_labels`].
pub fn extract_footnotes(text: &str) -> Vec<FootnoteMark> {
    extract_footnotes_with(text, &FOOTNOTE_PATTERN)
}

/// Like [`extract_footnotes`] with a custom pattern
///
/// The label is the `label` capture group if present, otherwise the whole match.
pub fn extract_footnotes_with(text: &str, pattern: &Regex) -> Vec<FootnoteMark> {
    let mut marks = Vec::new();
    let mut removed = 0;
    let mut scanned_bytes = 0;
    let mut scanned_chars = 0;

    for caps in pattern.captures_iter(text) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        scanned_chars += text[scanned_bytes..whole.start()].chars().count();
        scanned_bytes = whole.start();

        let label = caps
            .name("label")
            .map(|m| m.as_str())
            .unwrap_or(whole.as_str());

        marks.push(FootnoteMark {
            label: label.to_string(),
            position: scanned_chars - removed,
        });
        removed += whole.as_str().chars().count();
    }

    marks
}

/// Splices labels back into label-free text
///
/// Marks are applied right-to-left so earlier insertions never shift
/// positions still to be processed. A position past the end of the text
/// appends the label.
pub fn inject_footnotes(text: &str, marks: &[FootnoteMark]) -> String {
    inject_footnotes_with(text, marks, format_label)
}

/// Like [`inject_footnotes`] with a custom label format
pub fn inject_footnotes_with<F>(text: &str, marks: &[FootnoteMark], format: F) -> String
where
    F: Fn(&str) -> String,
{
    let mut ordered: Vec<&FootnoteMark> = marks.iter().collect();
    ordered.sort_by(|a, b| b.position.cmp(&a.position));

    let mut chars: Vec<char> = text.chars().collect();
    for mark in ordered {
        let label: Vec<char> = format(&mark.label).chars().collect();
        if mark.position > chars.len() {
            chars.extend(label);
        } else {
            chars.splice(mark.position..mark.position, label);
        }
    }

    chars.into_iter().collect()
}

/// Removes every footnote label from `text`
pub fn remove_footnote_labels(text: &str) -> String {
    FOOTNOTE_PATTERN.replace_all(text, "").into_owned()
}
