//! Statistics generation from the checkpoint file
//!
//! This module summarizes crawl progress for the `--status` command.

use crate::checkpoint::Checkpoint;
use crate::model::Metadata;
use std::collections::BTreeMap;

/// Progress counts for one genre
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenreProgress {
    pub completed: u64,
    pub total: u64,
}

/// Checkpoint statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckpointStats {
    /// Total number of documents in the checkpoint file
    pub total: u64,

    /// Documents whose every chapter was written
    pub completed: u64,

    /// Progress keyed by genre category
    pub by_genre: BTreeMap<String, GenreProgress>,

    /// Ids of documents still to be crawled, in checkpoint order
    pub pending_ids: Vec<String>,
}

impl CheckpointStats {
    pub fn pending(&self) -> u64 {
        self.total - self.completed
    }

    /// Returns the completion rate as a percentage
    pub fn completion_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.completed as f64 / self.total as f64) * 100.0
    }
}

/// Computes statistics over every persisted checkpoint
pub fn load_statistics(checkpoints: &[Checkpoint<Metadata>]) -> CheckpointStats {
    let mut stats = CheckpointStats::default();

    for checkpoint in checkpoints {
        stats.total += 1;
        let genre = stats
            .by_genre
            .entry(checkpoint.params.genre.category.clone())
            .or_default();
        genre.total += 1;

        if checkpoint.completed {
            stats.completed += 1;
            genre.completed += 1;
        } else {
            stats.pending_ids.push(checkpoint.id.clone());
        }
    }

    stats
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CheckpointStats) {
    println!("=== Crawl Progress ===\n");

    println!("Overview:");
    println!("  Documents: {}", stats.total);
    println!("  Completed: {}", stats.completed);
    println!("  Pending: {}", stats.pending());
    println!();

    if !stats.by_genre.is_empty() {
        println!("By Genre:");
        for (genre, progress) in &stats.by_genre {
            println!("  {}: {} / {}", genre, progress.completed, progress.total);
        }
        println!();
    }

    if !stats.pending_ids.is_empty() {
        println!("Pending Documents ({}):", stats.pending_ids.len());
        for id in &stats.pending_ids {
            println!("  - {}", id);
        }
        println!();
    }

    println!(
        "Completion: {:.1}% ({} / {} documents)",
        stats.completion_rate(),
        stats.completed,
        stats.total
    );
}
