//! Corpus-wide passes over chapters already written as JSON
//!
//! Two read-only consumers of the output directory live here: the size
//! statistics behind `--analyze` and the per-sentence task export behind
//! `--export-tasks`. Both walk `<genre>/<documentId> (<title>)/<chapterId>.json`
//! and skip files that do not parse as a chapter tree.

use crate::ids::Genre;
use crate::model::SentenceType;
use crate::tree::{parse_json_tree, ChapterTree, OutputFormat, TreeSentence};
use crate::{CorpusError, PersistenceError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Size of one chapter tree, or a sum of several
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeSize {
    pub files: u64,
    pub pages: u64,
    pub sentences: u64,
    pub words: u64,
}

impl TreeSize {
    fn add(&mut self, other: &TreeSize) {
        self.files += other.files;
        self.pages += other.pages;
        self.sentences += other.sentences;
        self.words += other.words;
    }

    pub fn words_per_sentence(&self) -> f64 {
        if self.sentences == 0 {
            return 0.0;
        }
        self.words as f64 / self.sentences as f64
    }
}

/// Sizes of every chapter tree under an output directory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorpusStats {
    pub total: TreeSize,

    /// Old and New Testament chapters
    pub scripture: TreeSize,

    /// Keyed by genre directory name
    pub by_genre: BTreeMap<String, TreeSize>,

    /// JSON files that were not chapter trees
    pub files_skipped: u64,
}

/// Counts pages, sentences and words of one tree
///
/// Only single sentences contribute words: the variants of a multi-language
/// sentence are translations of the same text.
pub fn measure_tree(tree: &ChapterTree) -> TreeSize {
    let pages = &tree.file.sect.pages;
    let mut size = TreeSize {
        files: 1,
        pages: pages.len() as u64,
        ..TreeSize::default()
    };

    for sentence in pages.iter().flat_map(|p| &p.sentences) {
        size.sentences += 1;
        if let TreeSentence::Single(single) = sentence {
            size.words += single.text.split_whitespace().count() as u64;
        }
    }

    size
}

/// Measures every chapter tree under `output_dir`
///
/// # Errors
///
/// Only failures to list the output directory. Unreadable or invalid
/// chapter files are counted in `files_skipped`.
pub fn analyze_corpus(output_dir: &Path) -> Result<CorpusStats, PersistenceError> {
    let mut stats = CorpusStats::default();

    for (genre, path) in chapter_json_files(output_dir)? {
        let tree = match read_tree(&path) {
            Ok(tree) => tree,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                stats.files_skipped += 1;
                continue;
            }
        };

        debug!("Measuring {}", path.display());
        let size = measure_tree(&tree);
        stats.total.add(&size);
        stats.by_genre.entry(genre).or_default().add(&size);
        if matches!(
            tree.file.meta.genre.code,
            Genre::NewTestament | Genre::OldTestament
        ) {
            stats.scripture.add(&size);
        }
    }

    Ok(stats)
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64) * 100.0
}

/// Prints corpus statistics to stdout
pub fn print_corpus_statistics(stats: &CorpusStats) {
    println!("=== Corpus Statistics ===\n");

    println!("Overview:");
    println!("  Files: {}", stats.total.files);
    println!("  Pages: {}", stats.total.pages);
    println!("  Sentences: {}", stats.total.sentences);
    println!("  Words: {}", stats.total.words);
    println!("  Words per sentence: {:.2}", stats.total.words_per_sentence());
    if stats.files_skipped > 0 {
        println!("  Skipped files: {}", stats.files_skipped);
    }
    println!();

    if !stats.by_genre.is_empty() {
        println!("By Genre:");
        for (genre, size) in &stats.by_genre {
            println!(
                "  {}: {} files, {} pages, {} sentences, {} words",
                genre, size.files, size.pages, size.sentences, size.words
            );
        }
        println!();
    }

    let scripture = &stats.scripture;
    println!("Scripture (Old and New Testament):");
    println!(
        "  Files: {} ({:.1}%)",
        scripture.files,
        percent(scripture.files, stats.total.files)
    );
    println!(
        "  Pages: {} ({:.1}%)",
        scripture.pages,
        percent(scripture.pages, stats.total.pages)
    );
    println!(
        "  Sentences: {} ({:.1}%)",
        scripture.sentences,
        percent(scripture.sentences, stats.total.sentences)
    );
    println!(
        "  Words: {} ({:.1}%)",
        scripture.words,
        percent(scripture.words, stats.total.words)
    );
}

/// Sentence payload of one labeling task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskData {
    pub text: String,
    pub document_id: String,
    pub chapter_id: String,
    pub sentence_id: String,
    pub sentence_type: SentenceType,
    /// Empty for single sentences
    pub language_code: String,
    pub title: String,
    pub genre_code: String,
}

/// One labeling task, wrapped the way labeling tools import it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceTask {
    pub data: TaskData,
}

/// Flattens a tree into one task per single sentence and one per language
/// variant of every multi-language sentence, in page order
pub fn tree_tasks(tree: &ChapterTree) -> Vec<SentenceTask> {
    let file = &tree.file;
    let task = |text: &str, sentence_id: &str, sentence_type, language_code: &str| SentenceTask {
        data: TaskData {
            text: text.to_string(),
            document_id: file.id.clone(),
            chapter_id: file.sect.id.clone(),
            sentence_id: sentence_id.to_string(),
            sentence_type,
            language_code: language_code.to_string(),
            title: file.meta.title.clone(),
            genre_code: file.meta.genre.code.code().to_string(),
        },
    };

    let mut tasks = Vec::new();
    for sentence in file.sect.pages.iter().flat_map(|p| &p.sentences) {
        match sentence {
            TreeSentence::Single(single) => {
                tasks.push(task(&single.text, &single.id, SentenceType::Single, ""));
            }
            TreeSentence::Multiple(multi) => {
                tasks.extend(multi.array.iter().map(|variant| {
                    task(
                        &variant.text,
                        &multi.id,
                        SentenceType::Multiple,
                        &variant.language_code,
                    )
                }));
            }
        }
    }
    tasks
}

/// Counters of one task export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub chapters_exported: u64,
    pub tasks_written: u64,
    pub files_skipped: u64,
}

/// Writes `<task_dir>/<genre>/<chapterId>.json` for every chapter tree under
/// `output_dir`, optionally only for one genre directory
///
/// # Errors
///
/// Failures to list the output directory or to write a task file.
pub fn export_tasks(
    output_dir: &Path,
    task_dir: &Path,
    genre: Option<&str>,
) -> Result<ExportReport, CorpusError> {
    let mut report = ExportReport::default();

    for (file_genre, path) in chapter_json_files(output_dir)? {
        if genre.is_some_and(|g| g != file_genre) {
            continue;
        }

        let tree = match read_tree(&path) {
            Ok(tree) => tree,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                report.files_skipped += 1;
                continue;
            }
        };

        let tasks = tree_tasks(&tree);
        let target = task_dir
            .join(&file_genre)
            .join(format!("{}.{}", tree.file.sect.id, OutputFormat::Json.extension()));
        let write_error = |source| PersistenceError::Write {
            path: target.clone(),
            source,
        };
        if let Some(dir) = target.parent() {
            std::fs::create_dir_all(dir).map_err(write_error)?;
        }
        std::fs::write(&target, serde_json::to_string_pretty(&tasks)?).map_err(write_error)?;

        info!("Exported {} tasks to {}", tasks.len(), target.display());
        report.chapters_exported += 1;
        report.tasks_written += tasks.len() as u64;
    }

    Ok(report)
}

fn read_tree(path: &Path) -> Result<ChapterTree, CorpusError> {
    let json = std::fs::read_to_string(path).map_err(|source| PersistenceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_json_tree(&json)?)
}

/// `(genre directory, path)` of every chapter JSON file, sorted by path
fn chapter_json_files(output_dir: &Path) -> Result<Vec<(String, PathBuf)>, PersistenceError> {
    let read_dir = |dir: &Path| {
        std::fs::read_dir(dir).map_err(|source| PersistenceError::Read {
            path: dir.to_path_buf(),
            source,
        })
    };

    let mut files = Vec::new();
    if !output_dir.exists() {
        return Ok(files);
    }

    for genre in read_dir(output_dir)?.flatten() {
        if !genre.path().is_dir() {
            continue;
        }
        let genre_name = genre.file_name().to_string_lossy().into_owned();
        for document in read_dir(&genre.path())?.flatten() {
            if !document.path().is_dir() {
                continue;
            }
            for chapter in read_dir(&document.path())?.flatten() {
                let path = chapter.path();
                if path.extension().is_some_and(|ext| ext == OutputFormat::Json.extension()) {
                    files.push((genre_name.clone(), path));
                }
            }
        }
    }

    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::metadata::tests::sample_metadata;
    use crate::output::{ChapterTarget, FileOutputHandler, OutputHandler};
    use crate::tree::builder::tests::{chapter, pages};
    use crate::tree::{generate_tree, TreeOptions, TreeRequest};
    use tempfile::TempDir;

    fn sample_tree() -> ChapterTree {
        generate_tree(
            TreeRequest {
                chapter: &chapter(),
                metadata: &sample_metadata(),
                pages: &pages(),
                annotations: &[],
            },
            &TreeOptions::default(),
        )
        .unwrap()
    }

    fn write_tree(handler: &FileOutputHandler, tree: &ChapterTree) -> PathBuf {
        let target = ChapterTarget::new(&tree.file.meta, &tree.file.id, &tree.file.sect.id);
        handler
            .write_chapter(&target, "json", &OutputFormat::Json.render(tree).unwrap())
            .unwrap()
    }

    /// The sample tree moved into the book genre
    fn book_tree() -> ChapterTree {
        let mut tree = sample_tree();
        tree.file.meta.genre.code = Genre::Book;
        tree.file.meta.genre.category = "book".to_string();
        tree
    }

    #[test]
    fn test_measure_tree() {
        let size = measure_tree(&sample_tree());
        assert_eq!(
            size,
            TreeSize {
                files: 1,
                pages: 1,
                sentences: 2,
                // "Đức Giê-su sinh ra tại Bê-lem." only
                words: 6,
            }
        );
        assert_eq!(size.words_per_sentence(), 3.0);
    }

    #[test]
    fn test_analyze_corpus_by_genre() {
        let dir = TempDir::new().unwrap();
        let handler = FileOutputHandler::new(dir.path());
        write_tree(&handler, &sample_tree());
        write_tree(&handler, &book_tree());

        let broken = dir.path().join("book").join("RCB_009 (Hỏng)");
        std::fs::create_dir_all(&broken).unwrap();
        std::fs::write(broken.join("RCB_009.001.json"), "{\"root\": 1}").unwrap();
        std::fs::write(broken.join("RCB_009.001.xml"), "<root/>").unwrap();

        let stats = analyze_corpus(dir.path()).unwrap();
        assert_eq!(stats.files_skipped, 1);
        assert_eq!(stats.total.files, 2);
        assert_eq!(stats.total.sentences, 4);
        assert_eq!(stats.total.words, 12);
        assert_eq!(stats.scripture.files, 1);
        assert_eq!(stats.scripture.words, 6);
        assert_eq!(stats.by_genre.len(), 2);
        assert_eq!(stats.by_genre["book"].pages, 1);
        assert_eq!(stats.by_genre["newTestament"].sentences, 2);
    }

    #[test]
    fn test_analyze_missing_dir() {
        let stats = analyze_corpus(Path::new("/nonexistent/output")).unwrap();
        assert_eq!(stats, CorpusStats::default());
    }

    #[test]
    fn test_tree_tasks() {
        let tasks = tree_tasks(&sample_tree());
        assert_eq!(tasks.len(), 3);

        assert_eq!(tasks[0].data.text, "Đức Giê-su sinh ra tại Bê-lem.");
        assert_eq!(tasks[0].data.sentence_id, "RCN_001.002.001.01");
        assert_eq!(tasks[0].data.sentence_type, SentenceType::Single);
        assert_eq!(tasks[0].data.language_code, "");
        assert_eq!(tasks[0].data.chapter_id, "RCN_001.002");
        assert_eq!(tasks[0].data.genre_code, "N");

        let variants: Vec<(&str, &str)> = tasks[1..]
            .iter()
            .map(|t| (t.data.language_code.as_str(), t.data.text.as_str()))
            .collect();
        assert_eq!(variants, vec![("vi", "Vua Hê-rô-đê"), ("en", "King Herod")]);
        assert!(tasks[1..]
            .iter()
            .all(|t| t.data.sentence_id == "RCN_001.002.001.02"
                && t.data.sentence_type == SentenceType::Multiple));
    }

    #[test]
    fn test_task_json_layout() {
        let tasks = tree_tasks(&sample_tree());
        let value = serde_json::to_value(&tasks[1]).unwrap();
        assert_eq!(value["data"]["sentenceType"], "multiple");
        assert_eq!(value["data"]["languageCode"], "vi");
        assert_eq!(value["data"]["documentId"], "RCN_001");
        assert_eq!(value["data"]["sentenceId"], "RCN_001.002.001.02");
    }

    #[test]
    fn test_export_tasks_for_one_genre() {
        let output = TempDir::new().unwrap();
        let task_dir = TempDir::new().unwrap();
        let handler = FileOutputHandler::new(output.path());
        write_tree(&handler, &sample_tree());
        write_tree(&handler, &book_tree());

        let report = export_tasks(output.path(), task_dir.path(), Some("newTestament")).unwrap();
        assert_eq!(
            report,
            ExportReport {
                chapters_exported: 1,
                tasks_written: 3,
                files_skipped: 0,
            }
        );

        let written = task_dir.path().join("newTestament").join("RCN_001.002.json");
        let tasks: Vec<SentenceTask> =
            serde_json::from_str(&std::fs::read_to_string(written).unwrap()).unwrap();
        assert_eq!(tasks, tree_tasks(&sample_tree()));
        assert!(!task_dir.path().join("book").exists());

        let report = export_tasks(output.path(), task_dir.path(), None).unwrap();
        assert_eq!(report.chapters_exported, 2);
        assert!(task_dir.path().join("book").join("RCN_001.002.json").exists());
    }
}
