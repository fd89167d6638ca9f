//! Chapter files on the local filesystem
//!
//! Layout: `<output_dir>/<genre>/<documentId> (<title>)/<chapterId>.<ext>`

use super::traits::{ChapterTarget, OutputHandler};
use crate::PersistenceError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Characters that cannot appear in a directory name on common filesystems
const RESERVED: &[char] = &['/', '\\', '?', '%', '*', ':', '|', '"', '<', '>'];

/// Replaces reserved path characters with `_`
pub fn sanitize_title(title: &str) -> String {
    title
        .trim()
        .chars()
        .map(|c| if RESERVED.contains(&c) || c.is_control() { '_' } else { c })
        .collect()
}

/// Writes chapter files under an output directory
#[derive(Debug, Clone)]
pub struct FileOutputHandler {
    output_dir: PathBuf,
}

impl FileOutputHandler {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Directory holding every chapter of a document
    pub fn document_dir(&self, target: &ChapterTarget) -> PathBuf {
        self.output_dir.join(&target.genre).join(format!(
            "{} ({})",
            target.document_id,
            sanitize_title(&target.title)
        ))
    }

    pub fn chapter_path(&self, target: &ChapterTarget, extension: &str) -> PathBuf {
        self.document_dir(target)
            .join(format!("{}.{}", target.chapter_id, extension))
    }
}

impl OutputHandler for FileOutputHandler {
    fn write_chapter(
        &self,
        target: &ChapterTarget,
        extension: &str,
        content: &str,
    ) -> Result<PathBuf, PersistenceError> {
        let path = self.chapter_path(target, extension);
        let write_error = |source| PersistenceError::Write {
            path: path.clone(),
            source,
        };

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(write_error)?;
        }
        std::fs::write(&path, content).map_err(write_error)?;

        debug!("Wrote {}", path.display());
        Ok(path)
    }
}
