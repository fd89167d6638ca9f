//! Output handler trait and the location of one chapter's files

use crate::model::Metadata;
use crate::PersistenceError;
use std::path::PathBuf;

/// Where a chapter's files belong
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterTarget {
    /// Genre category, e.g. `newTestament`
    pub genre: String,
    pub document_id: String,
    pub title: String,
    pub chapter_id: String,
}

impl ChapterTarget {
    pub fn new(metadata: &Metadata, document_id: &str, chapter_id: &str) -> Self {
        Self {
            genre: metadata.genre.category.clone(),
            document_id: document_id.to_string(),
            title: metadata.title.clone(),
            chapter_id: chapter_id.to_string(),
        }
    }
}

/// Trait for output handlers
///
/// Output handlers persist the rendered files of each chapter. The
/// coordinator calls them from its single sequential loop.
pub trait OutputHandler: Send + Sync {
    /// Writes one rendering of a chapter
    ///
    /// # Arguments
    ///
    /// * `target` - The chapter being written
    /// * `extension` - File extension of the rendering (`xml`, `json`, `md`)
    /// * `content` - The rendered file
    ///
    /// # Returns
    ///
    /// The path the file was written to
    fn write_chapter(
        &self,
        target: &ChapterTarget,
        extension: &str,
        content: &str,
    ) -> Result<PathBuf, PersistenceError>;
}
