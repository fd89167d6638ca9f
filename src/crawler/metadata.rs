//! Metadata catalog backed by a JSON file

use super::source::MetadataSource;
use crate::model::Metadata;
use crate::{CorpusError, PersistenceError};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

type RowFilter = Box<dyn Fn(&Metadata) -> bool + Send + Sync>;

/// Reads a JSON array of metadata rows
///
/// Rows that do not deserialize, or that have no document id, are logged
/// and skipped. The remaining rows are kept if the filter accepts them.
pub struct JsonMetadataCatalog {
    path: PathBuf,
    filter: RowFilter,
}

impl JsonMetadataCatalog {
    /// A catalog that keeps every well-formed row
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            filter: Box::new(|_| true),
        }
    }

    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Metadata) -> bool + Send + Sync + 'static,
    {
        self.filter = Box::new(filter);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MetadataSource for JsonMetadataCatalog {
    fn load(&self) -> Result<Vec<Metadata>, CorpusError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| {
            PersistenceError::Read {
                path: self.path.clone(),
                source,
            }
        })?;
        let rows: Vec<serde_json::Value> = serde_json::from_str(&content)?;
        let total = rows.len();

        let mut selected = Vec::new();
        for (index, row) in rows.into_iter().enumerate() {
            let meta: Metadata = match serde_json::from_value(row) {
                Ok(meta) => meta,
                Err(e) => {
                    warn!("Skipping metadata row {}: {}", index, e);
                    continue;
                }
            };
            if meta.document_id.trim().is_empty() {
                warn!("Skipping metadata row {}: no documentId", index);
                continue;
            }
            if (self.filter)(&meta) {
                selected.push(meta);
            }
        }

        info!(
            "Loaded {} of {} metadata rows from {}",
            selected.len(),
            total,
            self.path.display()
        );
        Ok(selected)
    }
}
