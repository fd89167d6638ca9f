//! Corpus-Harvest: a checkpointed corpus crawler
//!
//! This crate harvests long-form documents from web sources, normalizes them into a
//! hierarchical sentence-level corpus, and attaches positional annotations
//! (footnotes, headings, named-entity spans).

pub mod checkpoint;
pub mod config;
pub mod crawler;
pub mod ids;
pub mod markup;
pub mod model;
pub mod output;
pub mod task;
pub mod tree;

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for Corpus-Harvest operations
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),
}

/// Schema and identity violations
///
/// Always local: the offending unit (metadata row, chapter, tree) is skipped
/// and the run carries on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be below {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        max: u32,
    },

    #[error("Unknown {kind} code '{code}'")]
    UnknownCode { kind: &'static str, code: String },

    #[error("Genre '{0}' is reserved and cannot be used in identifiers")]
    ReservedGenre(String),

    #[error("Invalid {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl ValidationError {
    /// Shorthand for the catch-all variant
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Failures of the external collaborators (chapter discovery, page content, markdown)
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Task '{task}' timed out after {after:?}")]
    Timeout { task: String, after: Duration },

    #[error("Task '{task}' was cancelled")]
    Cancelled { task: String },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Failed to extract content from {url}: {message}")]
    Extract { url: String, message: String },

    #[error("Source returned no chapters for {url}")]
    NoChapters { url: String },

    #[error("Invalid content: {0}")]
    Invalid(#[from] ValidationError),
}

impl CollaboratorError {
    /// Whether the collaborator's own retry budget should try again
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Checkpoint and output file I/O failures
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Corrupt checkpoint file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize checkpoints: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type alias for Corpus-Harvest operations
pub type Result<T> = std::result::Result<T, CorpusError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for validation
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

// Re-export commonly used types
pub use checkpoint::{with_checkpoint, Checkpoint, CheckpointStore, Selection};
pub use config::Config;
pub use crawler::{ContentSource, Coordinator, CrawlReport};
pub use ids::{parse_id, DocumentParams, ParsedId};
pub use model::{Metadata, Page, Sentence};
pub use task::{TaskContext, TimedTask};
pub use tree::{generate_tree, ChapterTree};
