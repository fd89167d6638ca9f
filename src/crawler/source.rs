//! Capability traits implemented by content and metadata sources

use crate::ids::{Domain, Genre, SubDomain};
use crate::model::{Metadata, Page, SourceType};
use crate::task::TaskContext;
use crate::tree::ChapterParams;
use crate::{CollaboratorError, CorpusError, DocumentParams};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Everything a source needs to know about the document being crawled
#[derive(Debug, Clone)]
pub struct DocumentRequest {
    /// The document's source URL
    pub href: String,
    pub document: DocumentParams,
    pub metadata: Metadata,
}

/// Everything a source needs to know about one chapter
#[derive(Debug, Clone)]
pub struct ChapterRequest {
    pub href: String,
    /// Location of a ready-made markdown rendering, if the source has one
    pub md_href: Option<String>,
    pub chapter: ChapterParams,
    pub metadata: Metadata,
}

/// A chapter found on a document's index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterLink {
    pub href: String,
    pub chapter_number: u32,
    #[serde(default)]
    pub chapter_name: Option<String>,
    #[serde(default)]
    pub md_href: Option<String>,
}

/// Per-source adapter injected into the coordinator
///
/// Every call runs under a `TimedTask`; implementations should return
/// `CollaboratorError::Cancelled` promptly once `ctx` is cancelled.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Lists the chapters of a document that has them
    async fn discover_chapters(
        &self,
        ctx: &TaskContext,
        request: &DocumentRequest,
    ) -> Result<Vec<ChapterLink>, CollaboratorError>;

    /// Fetches the pages of one chapter
    async fn fetch_page_content(
        &self,
        ctx: &TaskContext,
        request: &ChapterRequest,
    ) -> Result<Vec<Page>, CollaboratorError>;

    /// Fetches a markdown rendering of one chapter, if the source offers one
    async fn fetch_markdown(
        &self,
        _ctx: &TaskContext,
        _request: &ChapterRequest,
    ) -> Result<Option<String>, CollaboratorError> {
        Ok(None)
    }
}

/// Supplier of the metadata rows a crawl starts from
pub trait MetadataSource: Send + Sync {
    fn load(&self) -> Result<Vec<Metadata>, CorpusError>;
}

/// Row predicate built from the `[selection]` config section
///
/// Unset fields match every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataFilter {
    pub source: Option<String>,
    pub source_type: Option<SourceType>,
    pub genres: Vec<Genre>,
}

impl MetadataFilter {
    pub fn matches(&self, meta: &Metadata) -> bool {
        self.source.as_ref().map_or(true, |s| &meta.source == s)
            && self.source_type.map_or(true, |t| meta.source_type == t)
            && (self.genres.is_empty() || self.genres.contains(&meta.genre.code))
    }
}

impl From<&crate::config::SelectionConfig> for MetadataFilter {
    fn from(config: &crate::config::SelectionConfig) -> Self {
        Self {
            source: config.source.clone(),
            source_type: config.source_type,
            genres: config.genres.clone(),
        }
    }
}

impl DocumentRequest {
    pub fn new(metadata: &Metadata, domain: Domain, sub_domain: SubDomain) -> Self {
        Self {
            href: metadata.source_url.clone(),
            document: metadata.document_params(domain, sub_domain),
            metadata: metadata.clone(),
        }
    }

    /// The implicit single chapter of a document without chapters
    pub fn implicit_chapter(&self) -> ChapterLink {
        ChapterLink {
            href: self.href.clone(),
            chapter_number: 1,
            chapter_name: None,
            md_href: None,
        }
    }

    pub fn chapter(&self, link: &ChapterLink) -> ChapterRequest {
        ChapterRequest {
            href: link.href.clone(),
            md_href: link.md_href.clone(),
            chapter: ChapterParams {
                document: self.document,
                chapter_number: link.chapter_number,
                chapter_name: link.chapter_name.clone().unwrap_or_default(),
            },
            metadata: self.metadata.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::metadata::tests::sample_metadata;

    #[test]
    fn test_metadata_filter() {
        let meta = sample_metadata();
        assert!(MetadataFilter::default().matches(&meta));

        let filter = MetadataFilter {
            genres: vec![Genre::NewTestament],
            source_type: Some(SourceType::Web),
            ..Default::default()
        };
        assert!(filter.matches(&meta));

        let filter = MetadataFilter {
            genres: vec![Genre::Book, Genre::Prayer],
            ..Default::default()
        };
        assert!(!filter.matches(&meta));

        let filter = MetadataFilter {
            source: Some("another-site".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&meta));
    }

    #[test]
    fn test_chapter_requests() {
        let meta = sample_metadata();
        let request = DocumentRequest::new(&meta, Domain::Religion, SubDomain::Catholic);
        assert_eq!(request.href, "https://example.org/mt");

        let chapter = request.chapter(&request.implicit_chapter());
        assert_eq!(chapter.chapter.chapter_number, 1);
        assert_eq!(chapter.chapter.chapter_id().unwrap(), "RCN_001.001");
        assert_eq!(chapter.href, request.href);

        let link: ChapterLink =
            serde_json::from_str(r#"{"href":"/mt/2","chapterNumber":2,"mdHref":"/mt/2.md"}"#)
                .unwrap();
        let chapter = request.chapter(&link);
        assert_eq!(chapter.chapter.chapter_name, "");
        assert_eq!(chapter.md_href.as_deref(), Some("/mt/2.md"));
    }
}
