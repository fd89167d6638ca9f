//! Content source for sites that publish chapters as JSON

use super::fetcher::{fetch_json, fetch_text, resolve_url, RetryPolicy};
use super::source::{ChapterLink, ChapterRequest, ContentSource, DocumentRequest};
use crate::model::Page;
use crate::task::TaskContext;
use crate::CollaboratorError;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Reads chapter lists and pages served as JSON
///
/// The document URL returns a `ChapterLink` array, each chapter URL returns
/// a `Page` array, and `mdHref`, when present, points at a markdown file.
/// Relative links are resolved against the URL they were found on.
#[derive(Debug, Clone)]
pub struct JsonSource {
    client: Client,
    retry: RetryPolicy,
}

impl JsonSource {
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }
}

#[async_trait]
impl ContentSource for JsonSource {
    async fn discover_chapters(
        &self,
        ctx: &TaskContext,
        request: &DocumentRequest,
    ) -> Result<Vec<ChapterLink>, CollaboratorError> {
        let links: Vec<ChapterLink> =
            fetch_json(&self.client, &request.href, &self.retry, ctx).await?;
        debug!("{} lists {} chapters", request.href, links.len());

        links
            .into_iter()
            .map(|link| {
                Ok(ChapterLink {
                    href: resolve_url(&request.href, &link.href)?,
                    md_href: link
                        .md_href
                        .as_deref()
                        .map(|md| resolve_url(&request.href, md))
                        .transpose()?,
                    ..link
                })
            })
            .collect()
    }

    async fn fetch_page_content(
        &self,
        ctx: &TaskContext,
        request: &ChapterRequest,
    ) -> Result<Vec<Page>, CollaboratorError> {
        fetch_json(&self.client, &request.href, &self.retry, ctx).await
    }

    async fn fetch_markdown(
        &self,
        ctx: &TaskContext,
        request: &ChapterRequest,
    ) -> Result<Option<String>, CollaboratorError> {
        match &request.md_href {
            Some(href) => fetch_text(&self.client, href, &self.retry, ctx)
                .await
                .map(Some),
            None => Ok(None),
        }
    }
}
