//! Corpus data model
//!
//! This module contains:
//! - Metadata: descriptive record of a source document
//! - Page: pages of sentences with attached footnotes and headings
//! - Annotation: named-entity spans over sentence text
//!
//! Every record comes with a validation function returning a
//! [`ValidationError`](crate::ValidationError) on the first violation.

pub mod annotation;
pub mod metadata;
pub mod page;

pub use annotation::{validate_annotation, EntityAnnotation, EntityLabel, SentenceEntityAnnotation};
pub use metadata::{
    parse_published_time, validate_metadata, GenreLabel, Metadata, SourceType, TagLabel,
};
pub use page::{
    validate_pages, AttributeValue, ExtraAttributes, Footnote, Heading, LanguageText,
    MultiSentence, Page, Sentence, SentenceFootnote, SentenceHeading, SentenceType,
    SingleSentence, TreeFootnote,
};
