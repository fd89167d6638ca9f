//! Content source for sites that only publish HTML
//!
//! Pages are fetched with the shared client and parsed with `scraper`. The
//! configured CSS selectors locate:
//! - Chapter links on a document's index page
//! - The content container and the blocks inside it
//! - Inline footnote references and footnote bodies
//!
//! Blocks are rendered to plain text (headings as `#` lines, references as
//! `[label]`) and handed to page assembly.

use super::assemble::{assemble_pages, RawChapter};
use super::fetcher::{fetch_text, RetryPolicy};
use super::source::{ChapterLink, ChapterRequest, ContentSource, DocumentRequest};
use super::splitter::SentenceSplitter;
use crate::config::SelectorConfig;
use crate::model::Page;
use crate::task::TaskContext;
use crate::{CollaboratorError, ConfigError};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};
use url::Url;

/// `[1] text`, `1. text`, `a) text` and similar footnote body openings
static FOOTNOTE_BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*\[?(?P<label>[A-Za-z0-9*]+)\]?[.:)]?\s+(?P<text>.+)$")
        .expect("valid footnote body regex")
});

static INLINE_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]+").expect("valid whitespace regex"));

/// Compiled form of `[source.selectors]`
#[derive(Debug, Clone)]
pub struct HtmlSelectors {
    chapter_link: Selector,
    content: Selector,
    block: Selector,
    footnote_ref: Option<Selector>,
    footnote_body: Option<Selector>,
}

impl HtmlSelectors {
    pub fn from_config(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            chapter_link: parse_selector("chapter-link", &config.chapter_link)?,
            content: parse_selector("content", &config.content)?,
            block: parse_selector("block", &config.block)?,
            footnote_ref: config
                .footnote_ref
                .as_deref()
                .map(|css| parse_selector("footnote-ref", css))
                .transpose()?,
            footnote_body: config
                .footnote_body
                .as_deref()
                .map(|css| parse_selector("footnote-body", css))
                .transpose()?,
        })
    }
}

fn parse_selector(name: &str, css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css)
        .map_err(|e| ConfigError::InvalidSelector(format!("{} selector '{}': {}", name, css, e)))
}

/// Scrapes chapters out of HTML pages
pub struct HtmlSource {
    client: Client,
    retry: RetryPolicy,
    selectors: HtmlSelectors,
    splitter: Arc<dyn SentenceSplitter>,
}

impl HtmlSource {
    pub fn new(
        client: Client,
        retry: RetryPolicy,
        selectors: HtmlSelectors,
        splitter: Arc<dyn SentenceSplitter>,
    ) -> Self {
        Self {
            client,
            retry,
            selectors,
            splitter,
        }
    }

    async fn fetch_chapter(
        &self,
        ctx: &TaskContext,
        request: &ChapterRequest,
    ) -> Result<RawChapter, CollaboratorError> {
        let body = fetch_text(&self.client, &request.href, &self.retry, ctx).await?;
        extract_chapter(&body, &self.selectors).map_err(|message| CollaboratorError::Extract {
            url: request.href.clone(),
            message,
        })
    }
}

#[async_trait]
impl ContentSource for HtmlSource {
    async fn discover_chapters(
        &self,
        ctx: &TaskContext,
        request: &DocumentRequest,
    ) -> Result<Vec<ChapterLink>, CollaboratorError> {
        let base = Url::parse(&request.href).map_err(|e| CollaboratorError::Extract {
            url: request.href.clone(),
            message: e.to_string(),
        })?;
        let body = fetch_text(&self.client, &request.href, &self.retry, ctx).await?;
        let links = extract_chapter_links(&body, &self.selectors.chapter_link, &base);
        if links.is_empty() {
            return Err(CollaboratorError::NoChapters {
                url: request.href.clone(),
            });
        }
        debug!("{} links to {} chapters", request.href, links.len());
        Ok(links)
    }

    async fn fetch_page_content(
        &self,
        ctx: &TaskContext,
        request: &ChapterRequest,
    ) -> Result<Vec<Page>, CollaboratorError> {
        let raw = self.fetch_chapter(ctx, request).await?;
        Ok(assemble_pages(&request.chapter, &raw, self.splitter.as_ref())?)
    }

    async fn fetch_markdown(
        &self,
        ctx: &TaskContext,
        request: &ChapterRequest,
    ) -> Result<Option<String>, CollaboratorError> {
        let raw = self.fetch_chapter(ctx, request).await?;
        Ok(Some(raw.text))
    }
}

/// Collects chapter links in page order, numbering them from 1
///
/// Duplicate targets and links that do not resolve to http(s) are skipped.
pub fn extract_chapter_links(html: &str, selector: &Selector, base: &Url) -> Vec<ChapterLink> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(selector) {
        let Some(href) = element.value().attr("href").and_then(|h| resolve_link(h, base)) else {
            continue;
        };
        if !seen.insert(href.clone()) {
            continue;
        }

        let name = collapse(&element.text().collect::<String>());
        links.push(ChapterLink {
            href,
            chapter_number: links.len() as u32 + 1,
            chapter_name: (!name.is_empty()).then_some(name),
            md_href: None,
        });
    }

    links
}

/// Resolves a link href to an absolute http(s) URL
///
/// Returns None for javascript:, mailto:, tel: and data: links, same-page
/// anchors and anything that does not resolve.
fn resolve_link(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| href.starts_with(scheme))
    {
        return None;
    }

    let absolute = base.join(href).ok()?;
    matches!(absolute.scheme(), "http" | "https").then(|| absolute.to_string())
}

/// Renders the content container of a chapter page
///
/// # Returns
///
/// * `Ok(RawChapter)` - Rendered text and the footnote bodies found
/// * `Err(String)` - The content selector matched nothing
pub fn extract_chapter(html: &str, selectors: &HtmlSelectors) -> Result<RawChapter, String> {
    let document = Html::parse_document(html);
    let content = document
        .select(&selectors.content)
        .next()
        .ok_or_else(|| "content selector matched nothing".to_string())?;

    let mut footnotes = BTreeMap::new();
    let mut note_nodes = HashSet::new();
    if let Some(body_selector) = &selectors.footnote_body {
        for element in document.select(body_selector) {
            note_nodes.insert(element.id());
            let text = collapse(&element.text().collect::<String>());
            match FOOTNOTE_BODY.captures(&text) {
                Some(caps) => {
                    footnotes.insert(caps["label"].to_string(), caps["text"].trim().to_string());
                }
                None => warn!("Footnote body without a label: '{}'", text),
            }
        }
    }

    let mut blocks = Vec::new();
    for block in content.select(&selectors.block) {
        let nested = block
            .ancestors()
            .filter_map(ElementRef::wrap)
            .take_while(|a| a.id() != content.id())
            .any(|a| note_nodes.contains(&a.id()) || selectors.block.matches(&a));
        if nested || note_nodes.contains(&block.id()) {
            continue;
        }

        let rendered = render_block(block, selectors.footnote_ref.as_ref());
        if !rendered.is_empty() {
            blocks.push(rendered);
        }
    }

    Ok(RawChapter {
        text: blocks.join("\n\n"),
        footnotes,
    })
}

fn render_block(block: ElementRef, refs: Option<&Selector>) -> String {
    let name = block.value().name();
    let level = match name.as_bytes() {
        [b'h', d @ b'1'..=b'6'] => Some((d - b'0') as usize),
        _ => None,
    };

    match level {
        Some(level) => {
            let text = collapse(&block.text().collect::<String>());
            if text.is_empty() {
                String::new()
            } else {
                format!("{} {}", "#".repeat(level), text)
            }
        }
        None => {
            let mut out = String::new();
            render_inline(block, refs, &mut out);
            out.lines()
                .map(collapse)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}

fn render_inline(element: ElementRef, refs: Option<&Selector>, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            if refs.is_some_and(|s| s.matches(&child_element)) {
                let label = child_element.text().collect::<String>();
                let label = label.trim().trim_matches(|c| c == '[' || c == ']');
                if !label.is_empty() {
                    out.push('[');
                    out.push_str(label);
                    out.push(']');
                }
            } else if child_element.value().name() == "br" {
                out.push('\n');
            } else {
                render_inline(child_element, refs, out);
            }
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
        }
    }
}

fn collapse(text: &str) -> String {
    INLINE_SPACE
        .replace_all(&text.replace('\n', " "), " ")
        .trim()
        .to_string()
}
