//! Named-entity annotations

use super::page::SentenceType;
use crate::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityLabel {
    Per,
    Loc,
    Org,
    Title,
    Tme,
    Num,
}

impl EntityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Per => "PER",
            Self::Loc => "LOC",
            Self::Org => "ORG",
            Self::Title => "TITLE",
            Self::Tme => "TME",
            Self::Num => "NUM",
        }
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labelled span of a sentence's text
///
/// `start` and `end` are character offsets, `end` exclusive. The first label
/// names the tag used when the span is wrapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityAnnotation {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub labels: Vec<EntityLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl EntityAnnotation {
    pub fn new(start: usize, end: usize, text: impl Into<String>, label: EntityLabel) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            labels: vec![label],
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Tag name used when wrapping
    pub fn primary_label(&self) -> Option<EntityLabel> {
        self.labels.first().copied()
    }
}

/// Checks an annotation against the text it claims to cover
pub fn validate_annotation(annotation: &EntityAnnotation, text: &str) -> ValidationResult<()> {
    if annotation.labels.is_empty() {
        return Err(ValidationError::invalid("annotation", "no labels"));
    }
    let length = text.chars().count();
    if annotation.start > annotation.end || annotation.end > length {
        return Err(ValidationError::invalid(
            "annotation",
            format!(
                "span {}..{} outside text of length {}",
                annotation.start, annotation.end, length
            ),
        ));
    }
    Ok(())
}

/// An annotation addressed to a sentence of a chapter tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceEntityAnnotation {
    #[serde(flatten)]
    pub annotation: EntityAnnotation,
    pub sentence_id: String,
    pub sentence_type: SentenceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

impl SentenceEntityAnnotation {
    /// Whether this annotation targets the given sentence (and language)
    pub fn targets(&self, sentence_id: &str, language_code: Option<&str>) -> bool {
        self.sentence_id == sentence_id
            && match language_code {
                Some(code) => self.language_code.as_deref() == Some(code),
                None => true,
            }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_serialization() {
        let json = serde_json::to_string(&vec![EntityLabel::Per, EntityLabel::Title]).unwrap();
        assert_eq!(json, r#"["PER","TITLE"]"#);
        assert_eq!(EntityLabel::Tme.to_string(), "TME");
    }

    #[test]
    fn test_sentence_annotation_json() {
        let json = r#"{"start":0,"end":3,"text":"The","labels":["PER"],"id":"1",
            "sentenceId":"RCN_001.001.001.01","sentenceType":"multiple","languageCode":"en"}"#;
        let ann: SentenceEntityAnnotation = serde_json::from_str(json).unwrap();
        assert_eq!(ann.annotation.primary_label(), Some(EntityLabel::Per));
        assert_eq!(ann.annotation.id.as_deref(), Some("1"));
        assert!(ann.targets("RCN_001.001.001.01", Some("en")));
        assert!(!ann.targets("RCN_001.001.001.01", Some("vi")));
        assert!(!ann.targets("RCN_001.001.001.02", None));
    }

    #[test]
    fn test_validate_annotation() {
        let ann = EntityAnnotation::new(0, 3, "Hà", EntityLabel::Loc);
        assert!(validate_annotation(&ann, "Hà Nội").is_ok());

        let ann = EntityAnnotation::new(4, 10, "Nội", EntityLabel::Loc);
        assert!(validate_annotation(&ann, "Hà Nội").is_err());

        let mut ann = EntityAnnotation::new(0, 1, "H", EntityLabel::Loc);
        ann.labels.clear();
        assert!(validate_annotation(&ann, "Hà Nội").is_err());
    }
}
