//! Re-annotation of chapters already written as JSON

use super::files::FileOutputHandler;
use super::traits::{ChapterTarget, OutputHandler};
use crate::ids::{self, parse_id};
use crate::model::SentenceEntityAnnotation;
use crate::tree::{apply_annotations, parse_json_tree, OutputFormat};
use crate::{CorpusError, PersistenceError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Counters of one annotation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotateReport {
    pub chapters_updated: u64,
    pub chapters_skipped: u64,
    /// Annotations whose sentence id could not be parsed
    pub annotations_ignored: u64,
}

/// Applies entity annotations to previously written chapters
///
/// Annotations are grouped by the chapter their sentence id belongs to.
/// Each chapter is read back from its JSON file, re-generated with its
/// group and rewritten in every requested format. A chapter whose JSON file
/// is missing, or whose annotations do not fit its text, is skipped.
///
/// # Errors
///
/// Only failures to read the output directory itself.
pub fn annotate_chapters(
    handler: &FileOutputHandler,
    annotations: &[SentenceEntityAnnotation],
    formats: &[OutputFormat],
) -> Result<AnnotateReport, CorpusError> {
    let mut report = AnnotateReport::default();
    let mut by_chapter: BTreeMap<(String, String), Vec<SentenceEntityAnnotation>> =
        BTreeMap::new();

    for annotation in annotations {
        match chapter_of(&annotation.sentence_id) {
            Some(key) => by_chapter.entry(key).or_default().push(annotation.clone()),
            None => {
                warn!("Ignoring annotation on unknown sentence '{}'", annotation.sentence_id);
                report.annotations_ignored += 1;
            }
        }
    }

    for ((document_id, chapter_id), group) in by_chapter {
        let Some(path) = find_chapter_json(handler.output_dir(), &document_id, &chapter_id)? else {
            warn!("No JSON output found for chapter {}", chapter_id);
            report.chapters_skipped += 1;
            continue;
        };

        match annotate_file(handler, &path, &group, formats) {
            Ok(()) => {
                info!("Annotated {} ({} annotations)", chapter_id, group.len());
                report.chapters_updated += 1;
            }
            Err(e) => {
                error!("Failed to annotate {}: {}", chapter_id, e);
                report.chapters_skipped += 1;
            }
        }
    }

    Ok(report)
}

fn annotate_file(
    handler: &FileOutputHandler,
    path: &Path,
    annotations: &[SentenceEntityAnnotation],
    formats: &[OutputFormat],
) -> Result<(), CorpusError> {
    let json = std::fs::read_to_string(path).map_err(|source| PersistenceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let tree = apply_annotations(&parse_json_tree(&json)?, annotations)?;

    let target = ChapterTarget::new(&tree.file.meta, &tree.file.id, &tree.file.sect.id);
    for format in formats {
        handler.write_chapter(&target, format.extension(), &format.render(&tree)?)?;
    }
    Ok(())
}

/// `(documentId, chapterId)` of a sentence id
fn chapter_of(sentence_id: &str) -> Option<(String, String)> {
    let parsed = parse_id(sentence_id)?;
    let params = parsed.document_params();
    let chapter = parsed.chapter_number?;
    Some((
        ids::document_id(&params).ok()?,
        ids::chapter_id(&params, chapter).ok()?,
    ))
}

/// Looks for `<genre>/<documentId> (<title>)/<chapterId>.json`
fn find_chapter_json(
    output_dir: &Path,
    document_id: &str,
    chapter_id: &str,
) -> Result<Option<PathBuf>, PersistenceError> {
    let read_dir = |dir: &Path| {
        std::fs::read_dir(dir).map_err(|source| PersistenceError::Read {
            path: dir.to_path_buf(),
            source,
        })
    };

    if !output_dir.exists() {
        return Ok(None);
    }

    let prefix = format!("{} (", document_id);
    let file_name = format!("{}.{}", chapter_id, OutputFormat::Json.extension());

    for genre in read_dir(output_dir)?.flatten() {
        if !genre.path().is_dir() {
            continue;
        }
        for document in read_dir(&genre.path())?.flatten() {
            if !document.file_name().to_string_lossy().starts_with(&prefix) {
                continue;
            }
            let candidate = document.path().join(&file_name);
            if candidate.is_file() {
                return Ok(Some(candidate));
            }
        }
    }

    Ok(None)
}
