//! XML serialization of chapter trees
//!
//! Element and attribute names are upper-case; extra sentence attributes
//! are converted from camelCase to SNAKE_CASE. Children are indented by two
//! spaces per level, and elements holding only text stay on one line.

use super::types::{ChapterTree, TreeSentence};
use crate::model::{ExtraAttributes, Metadata};
use quick_xml::escape::escape;
use regex::Regex;
use std::sync::LazyLock;

static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").expect("valid camelCase boundary regex"));

const INDENT: usize = 2;

enum Node {
    Element {
        name: String,
        attributes: Vec<(String, String)>,
        children: Vec<Node>,
    },
    /// Plain text, escaped on output
    Text(String),
    /// Already escaped markup
    Raw(String),
}

impl Node {
    fn element(name: impl Into<String>, children: Vec<Node>) -> Self {
        Self::Element {
            name: name.into(),
            attributes: Vec::new(),
            children,
        }
    }

    fn with_attributes(mut self, attrs: Vec<(String, String)>) -> Self {
        if let Self::Element { attributes, .. } = &mut self {
            *attributes = attrs;
        }
        self
    }

    fn text(name: impl Into<String>, value: impl ToString) -> Self {
        Self::element(name, vec![Self::Text(value.to_string())])
    }

    fn render(&self, level: usize, out: &mut String) {
        match self {
            Self::Text(text) => out.push_str(&escape(text.as_str())),
            Self::Raw(markup) => out.push_str(markup),
            Self::Element {
                name,
                attributes,
                children,
            } => {
                out.push('<');
                out.push_str(name);
                for (key, value) in attributes {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    out.push_str(&escape(value.as_str()));
                    out.push('"');
                }
                out.push('>');

                let inline = children
                    .iter()
                    .all(|c| matches!(c, Self::Text(_) | Self::Raw(_)));
                if inline {
                    for child in children {
                        child.render(level + 1, out);
                    }
                } else {
                    for child in children {
                        newline(level + 1, out);
                        child.render(level + 1, out);
                    }
                    newline(level, out);
                }

                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
    }
}

fn newline(level: usize, out: &mut String) {
    out.push('\n');
    out.extend(std::iter::repeat(' ').take(level * INDENT));
}

fn attr(key: &str, value: impl ToString) -> (String, String) {
    (key.to_string(), value.to_string())
}

/// `verseNumber` → `VERSE_NUMBER`
pub fn snake_upper(key: &str) -> String {
    CAMEL_BOUNDARY.replace_all(key, "${1}_${2}").to_uppercase()
}

fn extra_attributes(extra: &ExtraAttributes) -> impl Iterator<Item = (String, String)> + '_ {
    extra.iter().map(|(k, v)| (snake_upper(k), v.to_string()))
}

fn meta_node(meta: &Metadata) -> Node {
    let tags = meta
        .tags
        .iter()
        .map(|tag| {
            Node::element(
                "TAG",
                vec![
                    Node::text("CATEGORY", &tag.category),
                    Node::text("VIETNAMESE", &tag.vietnamese),
                ],
            )
        })
        .collect();

    let source_type = match meta.source_type {
        crate::model::SourceType::Web => "web",
        crate::model::SourceType::Pdf => "pdf",
        crate::model::SourceType::HardCopy => "hardCopy",
    };

    Node::element(
        "meta",
        vec![
            Node::text("DOCUMENT_ID", &meta.document_id),
            Node::text("DOCUMENT_NUMBER", meta.document_number),
            Node::element(
                "GENRE",
                vec![
                    Node::text("CODE", meta.genre.code),
                    Node::text("CATEGORY", &meta.genre.category),
                    Node::text("VIETNAMESE", &meta.genre.vietnamese),
                ],
            ),
            Node::element("TAGS", tags),
            Node::text("TITLE", &meta.title),
            Node::text("VOLUME", &meta.volume),
            Node::text("AUTHOR", &meta.author),
            Node::text("SOURCE_TYPE", source_type),
            Node::text("SOURCE_URL", &meta.source_url),
            Node::text("SOURCE", &meta.source),
            Node::text("HAS_CHAPTERS", meta.has_chapters),
            Node::text("PERIOD", &meta.period),
            Node::text("PUBLISHED_TIME", &meta.published_time),
            Node::text("LANGUAGE", &meta.language),
            Node::text("NOTE", &meta.note),
        ],
    )
}

fn content(text: &str, markup: Option<&String>) -> Node {
    match markup {
        Some(markup) => Node::Raw(markup.clone()),
        None => Node::Text(text.to_string()),
    }
}

fn sentence_node(sentence: &TreeSentence) -> Node {
    let (kind, children) = match sentence {
        TreeSentence::Single(s) => ("single", vec![content(&s.text, s.markup.as_ref())]),
        TreeSentence::Multiple(m) => (
            "multiple",
            m.array
                .iter()
                .map(|t| Node::element(&t.language_code, vec![content(&t.text, t.markup.as_ref())]))
                .collect(),
        ),
    };

    let mut attributes = vec![attr("ID", sentence.id()), attr("TYPE", kind)];
    attributes.extend(extra_attributes(sentence.extra_attributes()));

    Node::element("STC", children).with_attributes(attributes)
}

/// Renders a tree as indented XML under a `<root>` element
pub fn to_xml(tree: &ChapterTree) -> String {
    let file = &tree.file;
    let sect = &file.sect;

    let mut sect_children: Vec<Node> = sect
        .pages
        .iter()
        .map(|page| {
            Node::element("PAGE", page.sentences.iter().map(sentence_node).collect())
                .with_attributes(vec![attr("ID", &page.id), attr("NUMBER", page.number)])
        })
        .collect();

    sect_children.push(Node::element(
        "FOOTNOTES",
        sect.footnotes
            .iter()
            .map(|note| {
                Node::text("FOOTNOTE", &note.text).with_attributes(vec![
                    attr("SENTENCE_ID", &note.sentence_id),
                    attr("LABEL", &note.label),
                    attr("POSITION", note.position),
                    attr("ORDER", note.order),
                ])
            })
            .collect(),
    ));

    sect_children.push(Node::element(
        "HEADINGS",
        sect.headings
            .iter()
            .map(|heading| {
                Node::text("HEADING", &heading.text).with_attributes(vec![
                    attr("SENTENCE_ID", &heading.sentence_id),
                    attr("LEVEL", heading.level),
                    attr("ORDER", heading.order),
                ])
            })
            .collect(),
    ));

    let root = Node::element(
        "root",
        vec![Node::element(
            "FILE",
            vec![
                meta_node(&file.meta),
                Node::element("SECT", sect_children).with_attributes(vec![
                    attr("ID", &sect.id),
                    attr("NAME", &sect.name),
                    attr("NUMBER", sect.number),
                ]),
            ],
        )
        .with_attributes(vec![attr("ID", &file.id), attr("NUMBER", file.number)])],
    );

    let mut out = String::new();
    root.render(0, &mut out);
    out
}
