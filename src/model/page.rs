//! Pages, sentences, footnotes and headings

use crate::ids::category;
use crate::ids::MAX_NUMBER;
use crate::{ValidationError, ValidationResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

static CAMEL_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-zA-Z0-9]*$").expect("valid camelCase regex"));

/// A footnote reference extracted from text
///
/// `position` is a character offset into the label-free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footnote {
    pub label: String,
    pub text: String,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceFootnote {
    pub label: String,
    pub text: String,
    pub position: usize,
    pub sentence_id: String,
}

/// A footnote as listed in a chapter tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeFootnote {
    pub label: String,
    pub text: String,
    pub position: usize,
    pub sentence_id: String,
    pub order: usize,
}

impl SentenceFootnote {
    pub fn new(footnote: Footnote, sentence_id: impl Into<String>) -> Self {
        Self {
            label: footnote.label,
            text: footnote.text,
            position: footnote.position,
            sentence_id: sentence_id.into(),
        }
    }

    pub fn to_tree(&self, order: usize) -> TreeFootnote {
        TreeFootnote {
            label: self.label.clone(),
            text: self.text.clone(),
            position: self.position,
            sentence_id: self.sentence_id.clone(),
            order,
        }
    }

    /// The footnote without its sentence link
    pub fn footnote(&self) -> Footnote {
        Footnote {
            label: self.label.clone(),
            text: self.text.clone(),
            position: self.position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub text: String,
    pub level: u8,
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceHeading {
    pub text: String,
    pub level: u8,
    pub order: usize,
    pub sentence_id: String,
}

impl SentenceHeading {
    pub fn new(heading: Heading, sentence_id: impl Into<String>) -> Self {
        Self {
            text: heading.text,
            level: heading.level,
            order: heading.order,
            sentence_id: sentence_id.into(),
        }
    }
}

/// Value of an extra sentence attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

pub type ExtraAttributes = BTreeMap<String, AttributeValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleSentence {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub footnotes: Vec<SentenceFootnote>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headings: Vec<SentenceHeading>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_attributes: ExtraAttributes,
}

/// One language variant of a multi-language sentence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageText {
    pub language_code: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub footnotes: Vec<SentenceFootnote>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSentence {
    pub id: String,
    pub array: Vec<LanguageText>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headings: Vec<SentenceHeading>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_attributes: ExtraAttributes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SentenceType {
    Single,
    Multiple,
}

impl SentenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multiple => "multiple",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Sentence {
    Single(SingleSentence),
    Multiple(MultiSentence),
}

impl Sentence {
    pub fn id(&self) -> &str {
        match self {
            Self::Single(s) => &s.id,
            Self::Multiple(m) => &m.id,
        }
    }

    pub fn kind(&self) -> SentenceType {
        match self {
            Self::Single(_) => SentenceType::Single,
            Self::Multiple(_) => SentenceType::Multiple,
        }
    }

    pub fn headings(&self) -> &[SentenceHeading] {
        match self {
            Self::Single(s) => &s.headings,
            Self::Multiple(m) => &m.headings,
        }
    }

    pub fn extra_attributes(&self) -> &ExtraAttributes {
        match self {
            Self::Single(s) => &s.extra_attributes,
            Self::Multiple(m) => &m.extra_attributes,
        }
    }

    /// All footnotes of the sentence, across languages, in document order
    pub fn footnotes(&self) -> Vec<&SentenceFootnote> {
        match self {
            Self::Single(s) => s.footnotes.iter().collect(),
            Self::Multiple(m) => m.array.iter().flat_map(|t| t.footnotes.iter()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub number: u32,
    pub sentences: Vec<Sentence>,
}

/// Validates the pages of one chapter
///
/// Page numbers must run 1, 2, 3... without gaps, extra attribute keys must
/// be camelCase, heading levels must be 1..=6 and only the first sentence of
/// a page may carry headings.
pub fn validate_pages(pages: &[Page]) -> ValidationResult<()> {
    for (index, page) in pages.iter().enumerate() {
        let expected = index as u32 + 1;
        if page.number != expected {
            return Err(ValidationError::invalid(
                "page number",
                format!("page {} expected number {}, got {}", page.id, expected, page.number),
            ));
        }
        if page.number >= MAX_NUMBER {
            return Err(ValidationError::OutOfRange {
                field: "page number",
                value: page.number,
                max: MAX_NUMBER,
            });
        }

        for (position, sentence) in page.sentences.iter().enumerate() {
            validate_sentence(sentence, position == 0)?;
        }
    }
    Ok(())
}

fn validate_sentence(sentence: &Sentence, is_first: bool) -> ValidationResult<()> {
    for key in sentence.extra_attributes().keys() {
        if !CAMEL_CASE.is_match(key) {
            return Err(ValidationError::invalid(
                "extraAttributes",
                format!("key '{}' of {} is not camelCase", key, sentence.id()),
            ));
        }
    }

    let headings = sentence.headings();
    if !is_first && !headings.is_empty() {
        return Err(ValidationError::invalid(
            "headings",
            format!("{} is not the first sentence of its page", sentence.id()),
        ));
    }
    if let Some(h) = headings.iter().find(|h| !(1..=6).contains(&h.level)) {
        return Err(ValidationError::invalid(
            "headings",
            format!("level {} out of 1..=6 in {}", h.level, sentence.id()),
        ));
    }

    if let Sentence::Multiple(m) = sentence {
        if let Some(t) = m
            .array
            .iter()
            .find(|t| !category::is_language_code(&t.language_code))
        {
            return Err(ValidationError::UnknownCode {
                kind: "language",
                code: t.language_code.clone(),
            });
        }
    }

    Ok(())
}
