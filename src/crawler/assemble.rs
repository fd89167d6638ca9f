//! Page assembly from extracted chapter text
//!
//! Sources render a chapter as plain text: paragraphs separated by blank
//! lines, headings as `#` lines and footnote references as `[label]`.
//! This module turns that text into validated-shape `Page`s.

use super::splitter::SentenceSplitter;
use crate::ids::MAX_SENTENCE;
use crate::markup::{
    extract_footnotes, extract_headings, normalize_whitespace, remove_footnote_labels,
    remove_headings, split_paragraphs,
};
use crate::model::{
    Footnote, Heading, Page, Sentence, SentenceFootnote, SentenceHeading, SingleSentence,
};
use crate::tree::ChapterParams;
use crate::ValidationResult;
use std::collections::BTreeMap;
use tracing::warn;

/// A chapter as extracted by a source, before sentence splitting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawChapter {
    pub text: String,
    /// Footnote bodies keyed by label
    pub footnotes: BTreeMap<String, String>,
}

#[derive(Default)]
struct PageDraft {
    headings: Vec<Heading>,
    sentences: Vec<String>,
}

/// Builds the pages of a chapter
///
/// A heading that follows body text opens a new page, so headings always
/// land on the first sentence of a page. A page is also closed once it holds
/// the largest sentence number an id allows. Pages left without sentences
/// are dropped before numbering. Footnote labels with no matching body are
/// dropped with a warning.
///
/// # Errors
///
/// Returns a `ValidationError` if the chapter has more pages than ids allow.
pub fn assemble_pages(
    chapter: &ChapterParams,
    raw: &RawChapter,
    splitter: &dyn SentenceSplitter,
) -> ValidationResult<Vec<Page>> {
    let drafts = draft_pages(&normalize_whitespace(&raw.text), splitter);

    let mut pages = Vec::with_capacity(drafts.len());
    let mut heading_order = 0;
    for (index, draft) in drafts.into_iter().enumerate() {
        let number = index as u32 + 1;
        let mut sentences = Vec::with_capacity(draft.sentences.len());

        for (position, text) in draft.sentences.iter().enumerate() {
            let id = chapter.sentence_id(number, position as u32 + 1)?;

            let footnotes = extract_footnotes(text)
                .into_iter()
                .filter_map(|mark| match raw.footnotes.get(&mark.label) {
                    Some(body) => Some(SentenceFootnote::new(
                        Footnote {
                            label: mark.label,
                            text: body.clone(),
                            position: mark.position,
                        },
                        id.as_str(),
                    )),
                    None => {
                        warn!("Dropping footnote [{}] in {}: no matching body", mark.label, id);
                        None
                    }
                })
                .collect();

            let headings = if position == 0 {
                draft
                    .headings
                    .iter()
                    .map(|h| {
                        let heading = Heading {
                            order: heading_order,
                            ..h.clone()
                        };
                        heading_order += 1;
                        SentenceHeading::new(heading, id.as_str())
                    })
                    .collect()
            } else {
                Vec::new()
            };

            sentences.push(Sentence::Single(SingleSentence {
                id,
                text: remove_footnote_labels(text),
                footnotes,
                headings,
                extra_attributes: BTreeMap::new(),
            }));
        }

        pages.push(Page {
            id: chapter.page_id(number)?,
            number,
            sentences,
        });
    }

    Ok(pages)
}

fn draft_pages(text: &str, splitter: &dyn SentenceSplitter) -> Vec<PageDraft> {
    let mut drafts = vec![PageDraft::default()];

    for paragraph in split_paragraphs(text) {
        let headings = extract_headings(&paragraph);
        if !headings.is_empty() {
            if drafts.last().is_some_and(|d| !d.sentences.is_empty()) {
                drafts.push(PageDraft::default());
            }
            if let Some(draft) = drafts.last_mut() {
                draft.headings.extend(headings);
            }
        }

        for sentence in splitter.split(&remove_headings(&paragraph)) {
            if drafts
                .last()
                .is_some_and(|d| d.sentences.len() as u32 + 1 >= MAX_SENTENCE)
            {
                drafts.push(PageDraft::default());
            }
            if let Some(draft) = drafts.last_mut() {
                draft.sentences.push(sentence);
            }
        }
    }

    drafts.retain(|draft| {
        if draft.sentences.is_empty() && !draft.headings.is_empty() {
            warn!(
                "Dropping {} heading(s) with no text after them",
                draft.headings.len()
            );
        }
        !draft.sentences.is_empty()
    });
    drafts
}
