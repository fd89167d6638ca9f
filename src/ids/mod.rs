//! Hierarchical identity scheme
//!
//! Every unit of the corpus is addressed by a fixed-width identifier:
//!
//! ```text
//! DSG_fff            document   (domain, sub-domain, genre, document number)
//! DSG_fff.ccc        chapter
//! DSG_fff.ccc.ppp    page
//! DSG_fff.ccc.ppp.ss sentence
//! ```
//!
//! Builders validate every component; [`parse_id`] is total and returns
//! `None` for anything outside the grammar.

pub mod category;

pub use category::{CategoryEntry, Domain, Genre, SubDomain};

use crate::{ValidationError, ValidationResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Document, chapter and page numbers must be below this
pub const MAX_NUMBER: u32 = 1000;

/// Sentence numbers must be below this
pub const MAX_SENTENCE: u32 = 100;

static ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z])([A-Z])([A-Z])_(\d{3})(?:\.(\d{3})(?:\.(\d{3})(?:\.(\d{2}))?)?)?$")
        .expect("valid id regex")
});

/// Components shared by every identifier of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentParams {
    pub domain: Domain,
    pub sub_domain: SubDomain,
    pub genre: Genre,
    pub document_number: u32,
}

/// Which level of the hierarchy an identifier addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IdLevel {
    Document,
    Chapter,
    Page,
    Sentence,
}

/// Result of parsing an identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedId {
    pub domain: Domain,
    pub sub_domain: SubDomain,
    pub genre: Genre,
    pub document_number: u32,
    pub chapter_number: Option<u32>,
    pub page_number: Option<u32>,
    pub sentence_number: Option<u32>,
}

impl ParsedId {
    pub fn level(&self) -> IdLevel {
        match (self.chapter_number, self.page_number, self.sentence_number) {
            (Some(_), Some(_), Some(_)) => IdLevel::Sentence,
            (Some(_), Some(_), None) => IdLevel::Page,
            (Some(_), None, _) => IdLevel::Chapter,
            _ => IdLevel::Document,
        }
    }

    /// The builder input that produced this identifier
    pub fn document_params(&self) -> DocumentParams {
        DocumentParams {
            domain: self.domain,
            sub_domain: self.sub_domain,
            genre: self.genre,
            document_number: self.document_number,
        }
    }
}

fn check_range(field: &'static str, value: u32, max: u32) -> ValidationResult<()> {
    if value >= max {
        return Err(ValidationError::OutOfRange { field, value, max });
    }
    Ok(())
}

/// Builds a document identifier such as `RCN_001`
///
/// # Errors
///
/// Fails if the document number is out of range or the genre is reserved.
pub fn document_id(params: &DocumentParams) -> ValidationResult<String> {
    if params.genre.is_reserved() {
        return Err(ValidationError::ReservedGenre(params.genre.entry().category.to_string()));
    }
    check_range("document number", params.document_number, MAX_NUMBER)?;

    Ok(format!(
        "{}{}{}_{:03}",
        params.domain.code(),
        params.sub_domain.code(),
        params.genre.code(),
        params.document_number
    ))
}

/// Builds a chapter identifier such as `RCN_001.002`
pub fn chapter_id(params: &DocumentParams, chapter: u32) -> ValidationResult<String> {
    let document = document_id(params)?;
    check_range("chapter number", chapter, MAX_NUMBER)?;
    Ok(format!("{document}.{chapter:03}"))
}

/// Builds a page identifier such as `RCN_001.002.003`
pub fn page_id(params: &DocumentParams, chapter: u32, page: u32) -> ValidationResult<String> {
    let chapter = chapter_id(params, chapter)?;
    check_range("page number", page, MAX_NUMBER)?;
    Ok(format!("{chapter}.{page:03}"))
}

/// Builds a sentence identifier such as `RCN_001.002.003.04`
pub fn sentence_id(
    params: &DocumentParams,
    chapter: u32,
    page: u32,
    sentence: u32,
) -> ValidationResult<String> {
    let page = page_id(params, chapter, page)?;
    check_range("sentence number", sentence, MAX_SENTENCE)?;
    Ok(format!("{page}.{sentence:02}"))
}

/// Parses any level of identifier
///
/// Returns `None` for strings outside the grammar, including ones whose
/// category letters are not in the closed enumerations.
pub fn parse_id(id: &str) -> Option<ParsedId> {
    let caps = ID_PATTERN.captures(id)?;

    let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    Some(ParsedId {
        domain: Domain::from_code(&caps[1]).ok()?,
        sub_domain: SubDomain::from_code(&caps[2]).ok()?,
        genre: Genre::from_code(&caps[3]).ok()?,
        document_number: number(4)?,
        chapter_number: number(5),
        page_number: number(6),
        sentence_number: number(7),
    })
}
