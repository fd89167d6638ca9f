//! Resumable crawl checkpoints
//!
//! This module persists one `{id, completed, params}` record per crawl item
//! so an interrupted run resumes where it stopped.
//!
//! # Components
//!
//! - `Checkpoint`: one item's persisted state
//! - `CheckpointStore`: the JSON file backed list and its mutator
//! - `Selection`: run-level overrides of the default "incomplete only" view

mod store;

pub use store::CheckpointStore;

use crate::CorpusError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::future::Future;
use std::path::Path;
use tracing::info;

/// Persisted state of one crawl item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint<T> {
    pub id: String,
    pub completed: bool,
    pub params: T,
}

/// Overrides of the checkpoint view for a single run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Return every checkpoint, completed or not
    pub force_all: bool,
    /// Return exactly these ids
    pub force_ids: Vec<String>,
}

/// Opens the checkpoint store, seeding it on first use
///
/// `seed` runs only when the file is absent, empty or `[]`; it is awaited at
/// most once. The returned view is filtered and sorted per `selection`,
/// `filter` and `sort` (see [`CheckpointStore::view`]); the store is the
/// mutator for marking items complete.
///
/// # Errors
///
/// A corrupt checkpoint file, a failing seed or a failed initial write.
pub async fn with_checkpoint<T, S, Fut, I>(
    path: &Path,
    seed: S,
    get_id: I,
    filter: Option<&dyn Fn(&Checkpoint<T>) -> bool>,
    sort: Option<&dyn Fn(&Checkpoint<T>, &Checkpoint<T>) -> Ordering>,
    selection: &Selection,
) -> Result<(Vec<Checkpoint<T>>, CheckpointStore<T>), CorpusError>
where
    T: Serialize + DeserializeOwned + Clone,
    S: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>, CorpusError>>,
    I: Fn(&T) -> String,
{
    let mut store = CheckpointStore::open(path)?;

    if store.is_empty() {
        let items = seed().await?;
        info!(
            "Seeding checkpoint file {} with {} items",
            path.display(),
            items.len()
        );
        store.seed(items, get_id)?;
    } else {
        info!(
            "Resuming from checkpoint file {} ({} items)",
            path.display(),
            store.all().len()
        );
    }

    let view = store.view(filter, sort, selection);
    Ok((view, store))
}
