//! Positional markup utilities
//!
//! This module contains:
//! - Footnote: label extraction with label-free positions, and re-injection
//! - Heading: `#` heading extraction and removal
//! - Annotation: overlap resolution and nested `<LABEL>` wrapping
//! - Cleanup: whitespace normalization and paragraph splitting

pub mod annotation;
pub mod cleanup;
pub mod footnote;
pub mod heading;

pub use annotation::{resolve_overlap, wrap_labels, wrap_labels_escaped, OverlapPolicy};
pub use cleanup::{normalize_whitespace, split_paragraphs};
pub use footnote::{
    extract_footnotes, format_label, inject_footnotes, inject_footnotes_with,
    remove_footnote_labels, FootnoteMark,
};
pub use heading::{extract_headings, remove_headings};
