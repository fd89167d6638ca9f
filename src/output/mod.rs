//! Output module for persisting chapters and reporting progress
//!
//! This module handles:
//! - Writing rendered chapter files in the output directory layout
//! - Re-annotating chapters that were already written
//! - Summarizing checkpoint progress for status reports
//! - Measuring written chapters and exporting them as sentence tasks

mod annotate;
pub mod corpus;
mod files;
pub mod stats;
mod traits;

pub use annotate::{annotate_chapters, AnnotateReport};
pub use corpus::{
    analyze_corpus, export_tasks, print_corpus_statistics, tree_tasks, CorpusStats, ExportReport,
    SentenceTask,
};
pub use files::{sanitize_title, FileOutputHandler};
pub use stats::{load_statistics, print_statistics, CheckpointStats};
pub use traits::{ChapterTarget, OutputHandler};
