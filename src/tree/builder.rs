//! Tree generation from validated chapter inputs

use super::types::{
    ChapterParams, ChapterTree, TreeFile, TreeLanguageText, TreeMultiSentence, TreePage,
    TreeSection, TreeSentence, TreeSingleSentence,
};
use crate::markup::wrap_labels_escaped;
use crate::model::{
    parse_published_time, validate_annotation, validate_metadata, validate_pages, EntityAnnotation,
    Metadata, Page, Sentence, SentenceEntityAnnotation, SentenceHeading, TreeFootnote,
};
use crate::{ValidationError, ValidationResult};
use chrono::NaiveDate;

/// Recognizer for `publishedTime` values
pub type DateParser = fn(&str) -> Option<NaiveDate>;

/// Inputs of one chapter tree
#[derive(Debug, Clone, Copy)]
pub struct TreeRequest<'a> {
    pub chapter: &'a ChapterParams,
    pub metadata: &'a Metadata,
    pub pages: &'a [Page],
    /// Entity annotations to render inline; may be empty
    pub annotations: &'a [SentenceEntityAnnotation],
}

#[derive(Debug, Clone, Copy)]
pub struct TreeOptions {
    pub parse_date: DateParser,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            parse_date: parse_published_time,
        }
    }
}

/// Builds the canonical tree of one chapter
///
/// Validates the chapter identity, the metadata and the pages, then gathers
/// every sentence footnote (numbered by `order` in document order) and
/// heading onto the section. Annotations are matched to sentences by id, and
/// by language code for multi-language sentences.
///
/// # Errors
///
/// The first `ValidationError` found in any input. Inputs are never mutated.
pub fn generate_tree(request: TreeRequest<'_>, options: &TreeOptions) -> ValidationResult<ChapterTree> {
    let TreeRequest {
        chapter,
        metadata,
        pages,
        annotations,
    } = request;

    let document_id = chapter.document_id()?;
    let chapter_id = chapter.chapter_id()?;

    if metadata.genre.code != chapter.document.genre {
        return Err(ValidationError::invalid(
            "chapter",
            format!(
                "genre {} does not match metadata genre {}",
                chapter.document.genre, metadata.genre.code
            ),
        ));
    }
    if metadata.document_number != chapter.document.document_number {
        return Err(ValidationError::invalid(
            "chapter",
            format!(
                "document number {} does not match metadata {}",
                chapter.document.document_number, metadata.document_number
            ),
        ));
    }

    validate_metadata(metadata, options.parse_date)?;
    validate_pages(pages)?;

    let footnotes: Vec<TreeFootnote> = pages
        .iter()
        .flat_map(|page| page.sentences.iter())
        .flat_map(|sentence| sentence.footnotes())
        .enumerate()
        .map(|(order, note)| note.to_tree(order))
        .collect();

    let headings: Vec<SentenceHeading> = pages
        .iter()
        .flat_map(|page| page.sentences.iter())
        .flat_map(|sentence| sentence.headings().iter().cloned())
        .collect();

    let mut tree_pages: Vec<TreePage> = pages
        .iter()
        .map(|page| TreePage {
            id: page.id.clone(),
            number: page.number,
            sentences: page.sentences.iter().map(to_tree_sentence).collect(),
        })
        .collect();

    attach_markup(&mut tree_pages, annotations)?;

    let mut meta = metadata.for_tree();
    meta.document_id = document_id.clone();

    Ok(ChapterTree {
        file: TreeFile {
            id: document_id,
            number: metadata.document_number,
            meta,
            sect: TreeSection {
                id: chapter_id,
                name: chapter.chapter_name.clone(),
                number: chapter.chapter_number,
                pages: tree_pages,
                footnotes,
                headings,
                annotations: annotations.to_vec(),
            },
        },
    })
}

/// Re-generates an existing tree with a new set of annotations
///
/// Replaces the section's annotation list and recomputes every sentence's
/// inline markup. An empty list clears both.
pub fn apply_annotations(
    tree: &ChapterTree,
    annotations: &[SentenceEntityAnnotation],
) -> ValidationResult<ChapterTree> {
    let mut updated = tree.clone();
    updated.file.sect.annotations = annotations.to_vec();
    attach_markup(&mut updated.file.sect.pages, annotations)?;
    Ok(updated)
}

fn to_tree_sentence(sentence: &Sentence) -> TreeSentence {
    match sentence {
        Sentence::Single(s) => TreeSentence::Single(TreeSingleSentence {
            id: s.id.clone(),
            text: s.text.clone(),
            extra_attributes: s.extra_attributes.clone(),
            markup: None,
        }),
        Sentence::Multiple(m) => TreeSentence::Multiple(TreeMultiSentence {
            id: m.id.clone(),
            array: m
                .array
                .iter()
                .map(|t| TreeLanguageText {
                    language_code: t.language_code.clone(),
                    text: t.text.clone(),
                    markup: None,
                })
                .collect(),
            extra_attributes: m.extra_attributes.clone(),
        }),
    }
}

fn markup_for(
    text: &str,
    annotations: &[SentenceEntityAnnotation],
    sentence_id: &str,
    language_code: Option<&str>,
) -> ValidationResult<Option<String>> {
    let matched: Vec<EntityAnnotation> = annotations
        .iter()
        .filter(|a| a.targets(sentence_id, language_code))
        .map(|a| a.annotation.clone())
        .collect();

    if matched.is_empty() {
        return Ok(None);
    }
    for annotation in &matched {
        validate_annotation(annotation, text)?;
    }
    Ok(Some(wrap_labels_escaped(text, &matched)))
}

fn attach_markup(
    pages: &mut [TreePage],
    annotations: &[SentenceEntityAnnotation],
) -> ValidationResult<()> {
    for sentence in pages.iter_mut().flat_map(|p| p.sentences.iter_mut()) {
        match sentence {
            TreeSentence::Single(s) => {
                s.markup = markup_for(&s.text, annotations, &s.id, None)?;
            }
            TreeSentence::Multiple(m) => {
                for t in m.array.iter_mut() {
                    t.markup = markup_for(&t.text, annotations, &m.id, Some(&t.language_code))?;
                }
            }
        }
    }
    Ok(())
}
