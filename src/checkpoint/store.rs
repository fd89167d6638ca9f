//! JSON file backed checkpoint store

use super::{Checkpoint, Selection};
use crate::PersistenceError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

/// Per-item crawl state persisted as a pretty-printed JSON array
///
/// The whole list is rewritten on every change, through a temporary file
/// renamed over the original.
#[derive(Debug)]
pub struct CheckpointStore<T> {
    path: PathBuf,
    checkpoints: Vec<Checkpoint<T>>,
}

impl<T> CheckpointStore<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Opens the store at `path`, creating it as `[]` if absent
    ///
    /// # Errors
    ///
    /// * `PersistenceError::Read` / `Write` - The file or its directory is inaccessible
    /// * `PersistenceError::Corrupt` - The file exists but is not a checkpoint list
    pub fn open(path: &Path) -> Result<Self, PersistenceError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| PersistenceError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        if !path.exists() {
            debug!("Creating checkpoint file {}", path.display());
            fs::write(path, "[]").map_err(|source| PersistenceError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }

        let content = fs::read_to_string(path).map_err(|source| PersistenceError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let checkpoints = if content.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&content).map_err(|source| PersistenceError::Corrupt {
                path: path.to_path_buf(),
                source,
            })?
        };

        Ok(Self {
            path: path.to_path_buf(),
            checkpoints,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when nothing has been seeded yet
    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    /// Replaces the contents with one incomplete checkpoint per item
    ///
    /// Items whose id was already produced by an earlier item are skipped.
    pub fn seed<F>(&mut self, items: Vec<T>, get_id: F) -> Result<(), PersistenceError>
    where
        F: Fn(&T) -> String,
    {
        let mut seen = HashSet::new();
        self.checkpoints = items
            .into_iter()
            .filter_map(|params| {
                let id = get_id(&params);
                if !seen.insert(id.clone()) {
                    warn!("Duplicate checkpoint id {}, keeping the first", id);
                    return None;
                }
                Some(Checkpoint {
                    id,
                    completed: false,
                    params,
                })
            })
            .collect();

        self.save()
    }

    /// Every persisted checkpoint, in stored order
    pub fn all(&self) -> &[Checkpoint<T>] {
        &self.checkpoints
    }

    pub fn get(&self, id: &str) -> Option<&Checkpoint<T>> {
        self.checkpoints.iter().find(|c| c.id == id)
    }

    /// Filtered and sorted copy of the checkpoints
    ///
    /// `selection.force_all` returns everything, a non-empty
    /// `selection.force_ids` returns exactly those ids, otherwise `filter`
    /// applies (defaulting to incomplete checkpoints only). Sorting never
    /// touches the stored order.
    pub fn view(
        &self,
        filter: Option<&dyn Fn(&Checkpoint<T>) -> bool>,
        sort: Option<&dyn Fn(&Checkpoint<T>, &Checkpoint<T>) -> Ordering>,
        selection: &Selection,
    ) -> Vec<Checkpoint<T>> {
        let mut view: Vec<Checkpoint<T>> = if selection.force_all {
            self.checkpoints.clone()
        } else if !selection.force_ids.is_empty() {
            self.checkpoints
                .iter()
                .filter(|c| selection.force_ids.contains(&c.id))
                .cloned()
                .collect()
        } else if let Some(filter) = filter {
            self.checkpoints.iter().filter(|c| filter(c)).cloned().collect()
        } else {
            self.checkpoints
                .iter()
                .filter(|c| !c.completed)
                .cloned()
                .collect()
        };

        if let Some(sort) = sort {
            view.sort_by(|a, b| sort(a, b));
        }
        view
    }

    /// Marks a checkpoint as complete (or not) and persists immediately
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The checkpoint was found and the file rewritten
    /// * `Ok(false)` - No checkpoint has this id; nothing is written
    /// * `Err(PersistenceError)` - The write failed
    pub fn set_complete(&mut self, id: &str, completed: bool) -> Result<bool, PersistenceError> {
        match self.checkpoints.iter_mut().find(|c| c.id == id) {
            Some(checkpoint) => {
                checkpoint.completed = completed;
                self.save()?;
                Ok(true)
            }
            None => {
                error!("Checkpoint with id {} not found in saved checkpoints", id);
                Ok(false)
            }
        }
    }

    fn save(&self) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(&self.checkpoints)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json).map_err(|source| PersistenceError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| PersistenceError::Write {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }
}
