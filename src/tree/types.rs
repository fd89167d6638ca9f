//! Chapter tree types

use crate::ids::{self, DocumentParams, Genre};
use crate::model::{
    ExtraAttributes, Metadata, SentenceEntityAnnotation, SentenceHeading, TreeFootnote,
};
use crate::ValidationResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identity of one chapter of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterParams {
    #[serde(flatten)]
    pub document: DocumentParams,
    pub chapter_number: u32,
    #[serde(default)]
    pub chapter_name: String,
}

impl ChapterParams {
    pub fn document_id(&self) -> ValidationResult<String> {
        ids::document_id(&self.document)
    }

    pub fn chapter_id(&self) -> ValidationResult<String> {
        ids::chapter_id(&self.document, self.chapter_number)
    }

    pub fn page_id(&self, page: u32) -> ValidationResult<String> {
        ids::page_id(&self.document, self.chapter_number, page)
    }

    pub fn sentence_id(&self, page: u32, sentence: u32) -> ValidationResult<String> {
        ids::sentence_id(&self.document, self.chapter_number, page, sentence)
    }
}

/// Canonical per-chapter document tree
///
/// Serialized as JSON inside a `{"root": ...}` envelope, or as XML under a
/// `<root>` element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterTree {
    pub file: TreeFile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeFile {
    pub id: String,
    pub number: u32,
    pub meta: Metadata,
    pub sect: TreeSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeSection {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub number: u32,
    pub pages: Vec<TreePage>,
    #[serde(default)]
    pub footnotes: Vec<TreeFootnote>,
    #[serde(default)]
    pub headings: Vec<SentenceHeading>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<SentenceEntityAnnotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreePage {
    pub id: String,
    pub number: u32,
    pub sentences: Vec<TreeSentence>,
}

/// A sentence as it appears in a tree: footnotes and headings live on the
/// section instead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TreeSentence {
    Single(TreeSingleSentence),
    Multiple(TreeMultiSentence),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeSingleSentence {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_attributes: ExtraAttributes,
    /// XML-escaped text with entity tags, when annotations apply
    #[serde(skip)]
    pub markup: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeMultiSentence {
    pub id: String,
    pub array: Vec<TreeLanguageText>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_attributes: ExtraAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeLanguageText {
    pub language_code: String,
    pub text: String,
    #[serde(skip)]
    pub markup: Option<String>,
}

impl TreeSentence {
    pub fn id(&self) -> &str {
        match self {
            Self::Single(s) => &s.id,
            Self::Multiple(m) => &m.id,
        }
    }

    pub fn extra_attributes(&self) -> &ExtraAttributes {
        match self {
            Self::Single(s) => &s.extra_attributes,
            Self::Multiple(m) => &m.extra_attributes,
        }
    }
}

impl ChapterTree {
    /// Chapter identity recovered from the tree's own ids
    pub fn chapter_params(&self) -> Option<ChapterParams> {
        let parsed = ids::parse_id(&self.file.sect.id)?;
        Some(ChapterParams {
            document: parsed.document_params(),
            chapter_number: parsed.chapter_number?,
            chapter_name: self.file.sect.name.clone(),
        })
    }

    pub fn genre(&self) -> Genre {
        self.file.meta.genre.code
    }
}
