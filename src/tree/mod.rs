//! Chapter tree generation and serialization
//!
//! This module contains:
//! - Types: the canonical `ChapterTree` and the `ChapterParams` identifying a chapter
//! - Builder: validation, footnote/heading aggregation and annotation markup
//! - XML and JSON serializers, plus JSON parsing for re-annotation

pub(crate) mod builder;
mod json;
mod types;
mod xml;

pub use builder::{apply_annotations, generate_tree, DateParser, TreeOptions, TreeRequest};
pub use json::{parse_json_tree, to_json};
pub use types::{
    ChapterParams, ChapterTree, TreeFile, TreeLanguageText, TreeMultiSentence, TreePage,
    TreeSection, TreeSentence, TreeSingleSentence,
};
pub use xml::{snake_upper, to_xml};

use serde::{Deserialize, Serialize};

/// Serialization formats a chapter can be written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Xml,
    Json,
}

impl OutputFormat {
    /// File extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Xml => "xml",
            Self::Json => "json",
        }
    }

    /// Serializes `tree` in this format
    pub fn render(&self, tree: &ChapterTree) -> Result<String, serde_json::Error> {
        match self {
            Self::Xml => Ok(to_xml(tree)),
            Self::Json => to_json(tree),
        }
    }
}
