//! Document metadata and its validation

use crate::ids::category::{self, GENRES, TAGS};
use crate::ids::{DocumentParams, Domain, Genre, SubDomain, MAX_NUMBER};
use crate::{ValidationError, ValidationResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

/// Genre columns of a metadata row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreLabel {
    pub code: Genre,
    pub category: String,
    pub vietnamese: String,
}

/// One tag of a metadata row
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TagLabel {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub vietnamese: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceType {
    Web,
    Pdf,
    HardCopy,
}

/// Descriptive record of a source document
///
/// Immutable for the duration of a crawl. `requires_manual_check` is an
/// editorial flag and is cleared before metadata is copied into a tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub document_id: String,
    pub document_number: u32,
    pub genre: GenreLabel,
    #[serde(default)]
    pub tags: Vec<TagLabel>,
    pub title: String,
    #[serde(default)]
    pub volume: String,
    #[serde(default)]
    pub author: String,
    pub source_type: SourceType,
    #[serde(rename = "sourceURL", default)]
    pub source_url: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub has_chapters: bool,
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub published_time: String,
    pub language: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub requires_manual_check: bool,
    #[serde(default)]
    pub note: String,
}

impl Metadata {
    /// Identity components of this document within a domain and sub-domain
    pub fn document_params(&self, domain: Domain, sub_domain: SubDomain) -> DocumentParams {
        DocumentParams {
            domain,
            sub_domain,
            genre: self.genre.code,
            document_number: self.document_number,
        }
    }

    /// Copy of the metadata as it appears in a tree
    pub fn for_tree(&self) -> Self {
        Self {
            requires_manual_check: false,
            ..self.clone()
        }
    }
}

/// Default `publishedTime` parser: `dd/MM/yyyy` or a four-digit year
pub fn parse_published_time(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%d/%m/%Y") {
        return Some(date);
    }
    if value.len() == 4 && value.chars().all(|c| c.is_ascii_digit()) {
        let year = value.parse::<i32>().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }
    None
}

/// Validates a metadata row
///
/// # Arguments
///
/// * `meta` - The row to check
/// * `parse_date` - Recognizer for non-empty `publishedTime` values
///
/// # Returns
///
/// The first violation found, if any
pub fn validate_metadata<F>(meta: &Metadata, parse_date: F) -> ValidationResult<()>
where
    F: Fn(&str) -> Option<NaiveDate>,
{
    if meta.document_number >= MAX_NUMBER {
        return Err(ValidationError::OutOfRange {
            field: "document number",
            value: meta.document_number,
            max: MAX_NUMBER,
        });
    }

    validate_genre(&meta.genre)?;

    for tag in &meta.tags {
        validate_tag(tag)?;
    }

    if !category::is_language_label(&meta.language) {
        return Err(ValidationError::invalid(
            "language",
            format!("unknown language '{}'", meta.language),
        ));
    }

    if !meta.source_url.is_empty() {
        Url::parse(&meta.source_url).map_err(|e| {
            ValidationError::invalid("sourceURL", format!("'{}': {}", meta.source_url, e))
        })?;
    }

    if !meta.published_time.is_empty() && parse_date(&meta.published_time).is_none() {
        return Err(ValidationError::invalid(
            "publishedTime",
            format!("unrecognized date '{}'", meta.published_time),
        ));
    }

    Ok(())
}

fn validate_genre(genre: &GenreLabel) -> ValidationResult<()> {
    if genre.code.is_reserved() {
        return Err(ValidationError::ReservedGenre(genre.category.clone()));
    }

    let entry = category::find_by_category(GENRES, &genre.category).ok_or_else(|| {
        ValidationError::invalid("genre", format!("unknown category '{}'", genre.category))
    })?;

    if entry.reserved {
        return Err(ValidationError::ReservedGenre(genre.category.clone()));
    }
    if entry.vietnamese != genre.vietnamese {
        return Err(ValidationError::invalid(
            "genre",
            format!(
                "'{}' is not the translation of '{}'",
                genre.vietnamese, genre.category
            ),
        ));
    }
    if entry.code != genre.code.code().to_string() {
        return Err(ValidationError::invalid(
            "genre",
            format!("code {} does not match category '{}'", genre.code, genre.category),
        ));
    }

    Ok(())
}

fn validate_tag(tag: &TagLabel) -> ValidationResult<()> {
    if tag.category.is_empty() {
        return Ok(());
    }

    match category::find_by_category(TAGS, &tag.category) {
        Some(entry) if entry.vietnamese == tag.vietnamese => Ok(()),
        Some(_) => Err(ValidationError::invalid(
            "tags",
            format!("'{}' is not the translation of '{}'", tag.vietnamese, tag.category),
        )),
        None => Err(ValidationError::invalid(
            "tags",
            format!("unknown tag '{}'", tag.category),
        )),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_metadata() -> Metadata {
        Metadata {
            document_id: "RCN_001".to_string(),
            document_number: 1,
            genre: GenreLabel {
                code: Genre::NewTestament,
                category: "newTestament".to_string(),
                vietnamese: "Tân Ước".to_string(),
            },
            tags: vec![TagLabel {
                category: "theology".to_string(),
                vietnamese: "Thần học".to_string(),
            }],
            title: "Phúc Âm theo Thánh Mát-thêu".to_string(),
            volume: String::new(),
            author: "Mát-thêu".to_string(),
            source_type: SourceType::Web,
            source_url: "https://example.org/mt".to_string(),
            source: "example.org".to_string(),
            has_chapters: true,
            period: String::new(),
            published_time: "01/02/2003".to_string(),
            language: "Tiếng Việt".to_string(),
            requires_manual_check: false,
            note: String::new(),
        }
    }

    #[test]
    fn test_valid_metadata() {
        assert_eq!(validate_metadata(&sample_metadata(), parse_published_time), Ok(()));
    }

    #[test]
    fn test_genre_translation_mismatch() {
        let mut meta = sample_metadata();
        meta.genre.vietnamese = "Sách".to_string();
        assert!(validate_metadata(&meta, parse_published_time).is_err());
    }

    #[test]
    fn test_genre_code_mismatch() {
        let mut meta = sample_metadata();
        meta.genre.code = Genre::Book;
        assert!(validate_metadata(&meta, parse_published_time).is_err());
    }

    #[test]
    fn test_reserved_genre() {
        let mut meta = sample_metadata();
        meta.genre = GenreLabel {
            code: Genre::Reserved,
            category: "reserved".to_string(),
            vietnamese: "Dự phòng".to_string(),
        };
        assert!(matches!(
            validate_metadata(&meta, parse_published_time),
            Err(ValidationError::ReservedGenre(_))
        ));
    }

    #[test]
    fn test_empty_tag_allowed() {
        let mut meta = sample_metadata();
        meta.tags = vec![TagLabel::default()];
        assert!(validate_metadata(&meta, parse_published_time).is_ok());

        meta.tags = vec![TagLabel {
            category: "theology".to_string(),
            vietnamese: "Lịch sử".to_string(),
        }];
        assert!(validate_metadata(&meta, parse_published_time).is_err());
    }

    #[test]
    fn test_source_url() {
        let mut meta = sample_metadata();
        meta.source_url = String::new();
        assert!(validate_metadata(&meta, parse_published_time).is_ok());

        meta.source_url = "not a url".to_string();
        assert!(validate_metadata(&meta, parse_published_time).is_err());
    }

    #[test]
    fn test_published_time_formats() {
        assert!(parse_published_time("31/12/1999").is_some());
        assert!(parse_published_time("1999").is_some());
        assert!(parse_published_time("1999-12-31").is_none());
        assert!(parse_published_time("31/13/1999").is_none());
        assert!(parse_published_time("99").is_none());

        let mut meta = sample_metadata();
        meta.published_time = "yesterday".to_string();
        assert!(validate_metadata(&meta, parse_published_time).is_err());

        meta.published_time = String::new();
        assert!(validate_metadata(&meta, parse_published_time).is_ok());
    }

    #[test]
    fn test_custom_date_parser() {
        let mut meta = sample_metadata();
        meta.published_time = "anything".to_string();
        let lenient = |_: &str| NaiveDate::from_ymd_opt(2000, 1, 1);
        assert!(validate_metadata(&meta, lenient).is_ok());
    }

    #[test]
    fn test_unknown_language() {
        let mut meta = sample_metadata();
        meta.language = "vi".to_string();
        assert!(validate_metadata(&meta, parse_published_time).is_err());
    }

    #[test]
    fn test_document_number_limit() {
        let mut meta = sample_metadata();
        meta.document_number = 1000;
        assert!(matches!(
            validate_metadata(&meta, parse_published_time),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{
            "documentId": "RCB_007",
            "documentNumber": 7,
            "genre": {"code": "B", "category": "book", "vietnamese": "Sách"},
            "title": "Tự Thuật",
            "sourceType": "hardCopy",
            "sourceURL": "",
            "language": "Tiếng Việt",
            "requiresManualCheck": true
        }"#;
        let meta: Metadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.genre.code, Genre::Book);
        assert_eq!(meta.source_type, SourceType::HardCopy);
        assert!(meta.tags.is_empty());
        assert!(!meta.has_chapters);
        assert!(meta.requires_manual_check);

        let tree_meta = serde_json::to_value(meta.for_tree()).unwrap();
        assert!(tree_meta.get("requiresManualCheck").is_none());
        assert_eq!(tree_meta["sourceURL"], "");
    }
}
