//! Crawler module for document harvesting
//!
//! This module contains the core crawling logic, including:
//! - The `ContentSource` and `MetadataSource` capability traits
//! - HTTP fetching with a retry budget
//! - JSON and HTML content sources
//! - Page assembly and sentence splitting for scraped text
//! - Overall crawl coordination

mod assemble;
mod coordinator;
mod fetcher;
mod html_source;
mod json_source;
mod metadata;
mod source;
mod splitter;

pub use assemble::{assemble_pages, RawChapter};
pub use coordinator::{
    run_crawl, Coordinator, CrawlOptions, CrawlReport, DocumentFilter, DocumentOrder,
};
pub use fetcher::{build_http_client, fetch_json, fetch_text, resolve_url, user_agent, RetryPolicy};
pub use html_source::{extract_chapter, extract_chapter_links, HtmlSelectors, HtmlSource};
pub use json_source::JsonSource;
pub use metadata::JsonMetadataCatalog;
pub use source::{
    ChapterLink, ChapterRequest, ContentSource, DocumentRequest, MetadataFilter, MetadataSource,
};
pub use splitter::{PunctuationSplitter, SentenceSplitter};
