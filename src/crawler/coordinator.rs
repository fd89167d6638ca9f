//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop, which:
//! - Loads or seeds the checkpoint file from the metadata source
//! - Discovers the chapters of each pending document
//! - Fetches, validates and renders every chapter
//! - Writes the rendered files and marks finished documents complete
//!
//! Documents and chapters are processed strictly one after another. Every
//! call into the content source runs under a `TimedTask`.

use super::fetcher::{build_http_client, RetryPolicy};
use super::html_source::{HtmlSelectors, HtmlSource};
use super::json_source::JsonSource;
use super::metadata::JsonMetadataCatalog;
use super::source::{ChapterRequest, ContentSource, DocumentRequest, MetadataFilter, MetadataSource};
use super::splitter::PunctuationSplitter;
use crate::checkpoint::{with_checkpoint, Checkpoint, Selection};
use crate::config::{Config, SourceKind};
use crate::ids::{Domain, SubDomain};
use crate::model::{validate_metadata, Metadata};
use crate::output::{ChapterTarget, FileOutputHandler, OutputHandler};
use crate::task::TimedTask;
use crate::tree::{generate_tree, OutputFormat, TreeOptions, TreeRequest};
use crate::{ConfigError, CorpusError};
use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Comparator applied to the pending documents of a run
pub type DocumentOrder =
    Box<dyn Fn(&Checkpoint<Metadata>, &Checkpoint<Metadata>) -> Ordering + Send + Sync>;

/// Predicate choosing the checkpoints a run crawls
pub type DocumentFilter = Box<dyn Fn(&Checkpoint<Metadata>) -> bool + Send + Sync>;

/// Run-level settings of the coordinator
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub domain: Domain,
    pub sub_domain: SubDomain,
    pub timed: TimedTask,
    pub formats: Vec<OutputFormat>,
    pub export_markdown: bool,
    pub checkpoint_path: PathBuf,
    pub selection: Selection,
    pub tree: TreeOptions,
}

impl CrawlOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            domain: config.crawler.domain,
            sub_domain: config.crawler.sub_domain,
            timed: TimedTask::new(
                Duration::from_secs(config.crawler.timeout_secs),
                Duration::from_millis(config.crawler.grace_period_ms),
            ),
            formats: config.crawler.formats.clone(),
            export_markdown: config.source.export_markdown,
            checkpoint_path: config.checkpoint_path(),
            selection: Selection {
                force_all: config.checkpoint.force_all,
                force_ids: config.checkpoint.force_ids.clone(),
            },
            tree: TreeOptions::default(),
        }
    }
}

/// Counters of one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Documents taken from the checkpoint view
    pub documents_seen: u64,
    /// Documents whose every chapter was written this run
    pub documents_completed: u64,
    pub documents_failed: u64,
    pub chapters_written: u64,
    pub chapters_failed: u64,
    pub elapsed: Duration,
}

impl CrawlReport {
    /// Returns the chapter success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        let attempted = self.chapters_written + self.chapters_failed;
        if attempted == 0 {
            return 0.0;
        }
        (self.chapters_written as f64 / attempted as f64) * 100.0
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    options: CrawlOptions,
    source: Arc<dyn ContentSource>,
    metadata: Arc<dyn MetadataSource>,
    output: Arc<dyn OutputHandler>,
    filter: Option<DocumentFilter>,
    order: Option<DocumentOrder>,
}

impl Coordinator {
    /// Creates a coordinator from its collaborators
    ///
    /// # Arguments
    ///
    /// * `options` - Run-level settings
    /// * `source` - Per-source content adapter
    /// * `metadata` - Supplier of the rows used to seed the checkpoint file
    /// * `output` - Destination of the rendered chapter files
    pub fn new(
        options: CrawlOptions,
        source: Arc<dyn ContentSource>,
        metadata: Arc<dyn MetadataSource>,
        output: Arc<dyn OutputHandler>,
    ) -> Self {
        Self {
            options,
            source,
            metadata,
            output,
            filter: None,
            order: None,
        }
    }

    /// Creates a coordinator with the default collaborators for `config`
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(CorpusError)` - The HTTP client or the selectors could not be built
    pub fn from_config(config: &Config) -> Result<Self, CorpusError> {
        let client = build_http_client(&config.user_agent)?;
        let retry = RetryPolicy {
            retries: config.source.retries,
            delay: Duration::from_millis(config.source.retry_delay_ms),
        };

        let source: Arc<dyn ContentSource> = match config.source.kind {
            SourceKind::Json => Arc::new(JsonSource::new(client, retry)),
            SourceKind::Html => {
                let selectors = config.source.selectors.as_ref().ok_or_else(|| {
                    ConfigError::Validation(
                        "[source.selectors] is required for the html source".to_string(),
                    )
                })?;
                Arc::new(HtmlSource::new(
                    client,
                    retry,
                    HtmlSelectors::from_config(selectors)?,
                    Arc::new(PunctuationSplitter),
                ))
            }
        };

        let filter = MetadataFilter::from(&config.selection);
        let metadata = JsonMetadataCatalog::new(&config.paths.metadata_path)
            .with_filter(move |meta| filter.matches(meta));

        Ok(Self::new(
            CrawlOptions::from_config(config),
            source,
            Arc::new(metadata),
            Arc::new(FileOutputHandler::new(&config.paths.output_dir)),
        ))
    }

    /// Sets which checkpoints are crawled
    ///
    /// Replaces the default of crawling only incomplete documents. The
    /// force-all and force-ids selections still take precedence.
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Checkpoint<Metadata>) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Sets the order in which pending documents are crawled
    pub fn with_order<F>(mut self, order: F) -> Self
    where
        F: Fn(&Checkpoint<Metadata>, &Checkpoint<Metadata>) -> Ordering + Send + Sync + 'static,
    {
        self.order = Some(Box::new(order));
        self
    }

    /// Runs the main crawl loop
    ///
    /// Failures are contained to the chapter or document they occur in.
    ///
    /// # Errors
    ///
    /// Only failures to open or seed the checkpoint file.
    pub async fn run(&self) -> Result<CrawlReport, CorpusError> {
        let start_time = Instant::now();
        let metadata = Arc::clone(&self.metadata);
        let filter = self
            .filter
            .as_deref()
            .map(|filter| filter as &dyn Fn(&Checkpoint<Metadata>) -> bool);
        let sort = self
            .order
            .as_deref()
            .map(|order| order as &dyn Fn(&Checkpoint<Metadata>, &Checkpoint<Metadata>) -> Ordering);

        let (pending, mut store) = with_checkpoint(
            &self.options.checkpoint_path,
            || async move { metadata.load() },
            |meta: &Metadata| meta.document_id.clone(),
            filter,
            sort,
            &self.options.selection,
        )
        .await?;

        info!("Starting crawl of {} documents", pending.len());
        let mut report = CrawlReport::default();

        for checkpoint in &pending {
            report.documents_seen += 1;

            if self.process_document(checkpoint, &mut report).await {
                report.documents_completed += 1;
                if let Err(e) = store.set_complete(&checkpoint.id, true) {
                    error!("Failed to mark {} complete: {}", checkpoint.id, e);
                }
            } else {
                report.documents_failed += 1;
            }

            info!(
                "Progress: {}/{} documents, {} chapters written, {} chapters failed",
                report.documents_seen,
                pending.len(),
                report.chapters_written,
                report.chapters_failed
            );
        }

        report.elapsed = start_time.elapsed();
        info!(
            "Crawl completed: {} of {} documents complete, {} chapters written ({:.1}% of attempted) in {:?}",
            report.documents_completed,
            report.documents_seen,
            report.chapters_written,
            report.success_rate(),
            report.elapsed
        );

        Ok(report)
    }

    /// Crawls one document
    ///
    /// Returns true if every chapter was written.
    async fn process_document(
        &self,
        checkpoint: &Checkpoint<Metadata>,
        report: &mut CrawlReport,
    ) -> bool {
        let meta = &checkpoint.params;
        if let Err(e) = validate_metadata(meta, self.options.tree.parse_date) {
            error!("Invalid metadata for {}, skipping document: {}", checkpoint.id, e);
            return false;
        }

        let request = DocumentRequest::new(meta, self.options.domain, self.options.sub_domain);

        let links = if meta.has_chapters {
            let source = &self.source;
            let document = &request;
            let discovered = self
                .options
                .timed
                .run(&format!("discover chapters of {}", checkpoint.id), |ctx| async move {
                    source.discover_chapters(&ctx, document).await
                })
                .await;

            match discovered {
                Ok(links) if links.is_empty() => {
                    error!("No chapters found for {}, skipping document", checkpoint.id);
                    return false;
                }
                Ok(links) => links,
                Err(e) => {
                    error!("Chapter discovery failed for {}: {}", checkpoint.id, e);
                    return false;
                }
            }
        } else {
            vec![request.implicit_chapter()]
        };

        info!("Crawling {} ({} chapters)", checkpoint.id, links.len());

        let mut all_written = true;
        for link in &links {
            let chapter = request.chapter(link);
            match self.process_chapter(&chapter).await {
                Ok(()) => report.chapters_written += 1,
                Err(e) => {
                    error!(
                        "Error processing chapter {} of {}: {}",
                        link.chapter_number, checkpoint.id, e
                    );
                    report.chapters_failed += 1;
                    all_written = false;
                }
            }
        }

        all_written
    }

    /// Fetches, renders and writes one chapter
    async fn process_chapter(&self, chapter: &ChapterRequest) -> Result<(), CorpusError> {
        let chapter_id = chapter.chapter.chapter_id()?;
        let source = &self.source;

        let pages = self
            .options
            .timed
            .run(&format!("fetch pages of {}", chapter_id), |ctx| async move {
                source.fetch_page_content(&ctx, chapter).await
            })
            .await?;

        let tree = generate_tree(
            TreeRequest {
                chapter: &chapter.chapter,
                metadata: &chapter.metadata,
                pages: &pages,
                annotations: &[],
            },
            &self.options.tree,
        )?;

        let target = ChapterTarget::new(&chapter.metadata, &tree.file.id, &tree.file.sect.id);
        for format in &self.options.formats {
            let rendered = format.render(&tree)?;
            self.output
                .write_chapter(&target, format.extension(), &rendered)?;
        }

        if self.options.export_markdown {
            let markdown = self
                .options
                .timed
                .run(&format!("fetch markdown of {}", chapter_id), |ctx| async move {
                    source.fetch_markdown(&ctx, chapter).await
                })
                .await;

            match markdown {
                Ok(Some(markdown)) => {
                    if let Err(e) = self.output.write_chapter(&target, "md", &markdown) {
                        warn!("Failed to write markdown of {}: {}", chapter_id, e);
                    }
                }
                Ok(None) => debug!("No markdown available for {}", chapter_id),
                Err(e) => warn!("Markdown export failed for {}: {}", chapter_id, e),
            }
        }

        info!("Wrote chapter {} ({} pages)", chapter_id, pages.len());
        Ok(())
    }
}

/// Runs a complete crawl with the default collaborators
///
/// # Example
///
/// ```no_run
/// use corpus_harvest::config::load_config;
/// use corpus_harvest::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let report = run_crawl(&config).await?;
/// println!("{} documents completed", report.documents_completed);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config) -> Result<CrawlReport, CorpusError> {
    Coordinator::from_config(config)?.run().await
}
