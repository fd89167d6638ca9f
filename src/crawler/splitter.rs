//! Sentence splitting for extracted paragraphs

use regex::Regex;
use std::sync::LazyLock;

/// Terminal punctuation, then closing quotes or brackets, then footnote
/// labels, then the whitespace that ends the sentence
static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[.!?…]+["'”’»)]*(?:\[[a-zA-Z0-9*]+\])*\s+"#).expect("valid sentence end regex")
});

/// Breaks a paragraph into sentences
pub trait SentenceSplitter: Send + Sync {
    /// Returns the trimmed, non-empty sentences of `paragraph` in order
    fn split(&self, paragraph: &str) -> Vec<String>;
}

/// Line and terminal-punctuation splitter
///
/// Every line is split separately. Closing quotes and footnote labels that
/// follow the punctuation stay with the sentence they close.
#[derive(Debug, Clone, Copy, Default)]
pub struct PunctuationSplitter;

impl SentenceSplitter for PunctuationSplitter {
    fn split(&self, paragraph: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        for line in paragraph.lines() {
            let mut start = 0;
            for m in SENTENCE_END.find_iter(line) {
                push_trimmed(&mut sentences, &line[start..m.end()]);
                start = m.end();
            }
            push_trimmed(&mut sentences, &line[start..]);
        }
        sentences
    }
}

fn push_trimmed(out: &mut Vec<String>, sentence: &str) {
    let sentence = sentence.trim();
    if !sentence.is_empty() {
        out.push(sentence.to_string());
    }
}
