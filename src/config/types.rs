use crate::ids::{Domain, Genre, SubDomain};
use crate::model::SourceType;
use crate::tree::OutputFormat;
use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for corpus-harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub paths: PathsConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
    pub source: SourceConfig,
}

/// Crawl identity and task limits
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Short name of this crawl, used in the default checkpoint file name
    pub name: String,

    pub domain: Domain,

    pub sub_domain: SubDomain,

    /// Upper bound for a single discovery or page fetch (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// How long a timed-out task may run its teardown (milliseconds)
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,

    /// Formats written for each chapter
    #[serde(default = "default_formats")]
    pub formats: Vec<OutputFormat>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: String,

    /// Email address for crawler-related contact
    pub contact_email: String,
}

/// Input and output locations
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PathsConfig {
    /// JSON array of metadata rows
    pub metadata_path: PathBuf,

    /// Defaults to `{domain}{subDomain}-{name}-checkpoint.json` next to the
    /// metadata file
    #[serde(default)]
    pub checkpoint_path: Option<PathBuf>,

    pub output_dir: PathBuf,
}

/// Which metadata rows take part in the crawl; empty fields match everything
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SelectionConfig {
    #[serde(default)]
    pub source: Option<String>,

    #[serde(default)]
    pub source_type: Option<SourceType>,

    #[serde(default)]
    pub genres: Vec<Genre>,
}

/// Re-run controls for completed checkpoints
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CheckpointConfig {
    #[serde(default)]
    pub force_all: bool,

    #[serde(default)]
    pub force_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Chapter lists and pages served as JSON
    Json,
    /// HTML pages scraped with CSS selectors
    Html,
}

/// Content source configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourceConfig {
    pub kind: SourceKind,

    /// Retries after the first attempt for transient HTTP failures
    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Also write a markdown rendering of each chapter
    #[serde(default)]
    pub export_markdown: bool,

    /// Required when `kind = "html"`
    #[serde(default)]
    pub selectors: Option<SelectorConfig>,
}

/// CSS selectors used by the HTML source
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SelectorConfig {
    /// Links to chapters on a document's index page
    pub chapter_link: String,

    /// Container of the chapter text
    pub content: String,

    /// Blocks inside the container that become paragraphs or headings
    #[serde(default = "default_block_selector")]
    pub block: String,

    /// Inline footnote references, rendered as `[label]`
    #[serde(default)]
    pub footnote_ref: Option<String>,

    /// Footnote bodies, each starting with its label
    #[serde(default)]
    pub footnote_body: Option<String>,
}

fn default_timeout_secs() -> u64 {
    crate::task::DEFAULT_TIMEOUT.as_secs()
}

fn default_grace_period_ms() -> u64 {
    crate::task::DEFAULT_GRACE.as_millis() as u64
}

fn default_formats() -> Vec<OutputFormat> {
    vec![OutputFormat::Xml, OutputFormat::Json]
}

fn default_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_block_selector() -> String {
    "h1, h2, h3, h4, h5, h6, p".to_string()
}

impl Config {
    /// Checkpoint file for this crawl
    pub fn checkpoint_path(&self) -> PathBuf {
        if let Some(path) = &self.paths.checkpoint_path {
            return path.clone();
        }
        let file = format!(
            "{}{}-{}-checkpoint.json",
            self.crawler.domain.code(),
            self.crawler.sub_domain.code(),
            self.crawler.name
        );
        match self.paths.metadata_path.parent() {
            Some(dir) => dir.join(file),
            None => PathBuf::from(file),
        }
    }
}
