//! JSON serialization of chapter trees

use super::types::ChapterTree;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    root: &'a ChapterTree,
}

#[derive(Deserialize)]
struct Envelope {
    root: ChapterTree,
}

/// Renders a tree as pretty-printed JSON inside a `{"root": ...}` envelope
///
/// Sentences carry their plain text; annotations stay in the section's list.
pub fn to_json(tree: &ChapterTree) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&EnvelopeRef { root: tree })
}

/// Reads back a tree written by [`to_json`]
///
/// Inline markup is not stored in JSON; use
/// [`apply_annotations`](super::apply_annotations) to rebuild it.
pub fn parse_json_tree(json: &str) -> Result<ChapterTree, serde_json::Error> {
    serde_json::from_str::<Envelope>(json).map(|e| e.root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::metadata::tests::sample_metadata;
    use crate::model::{EntityAnnotation, EntityLabel, SentenceEntityAnnotation, SentenceType};
    use crate::tree::builder::tests::{chapter, pages};
    use crate::tree::{apply_annotations, generate_tree, TreeOptions, TreeRequest};

    #[test]
    fn test_json_shape_and_reparse() {
        let chapter = chapter();
        let meta = sample_metadata();
        let pages = pages();
        let annotations = vec![SentenceEntityAnnotation {
            annotation: EntityAnnotation::new(0, 4, "King", EntityLabel::Title),
            sentence_id: "RCN_001.002.001.02".to_string(),
            sentence_type: SentenceType::Multiple,
            language_code: Some("en".to_string()),
        }];
        let tree = generate_tree(
            TreeRequest {
                chapter: &chapter,
                metadata: &meta,
                pages: &pages,
                annotations: &annotations,
            },
            &TreeOptions::default(),
        )
        .unwrap();

        let json = to_json(&tree).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let file = &value["root"]["file"];
        assert_eq!(file["id"], "RCN_001");
        assert_eq!(file["meta"]["sourceURL"], "https://example.org/mt");
        assert!(file["meta"].get("requiresManualCheck").is_none());

        let sect = &file["sect"];
        assert_eq!(sect["pages"][0]["sentences"][0]["type"], "single");
        assert!(sect["pages"][0]["sentences"][0].get("footnotes").is_none());
        assert!(sect["pages"][0]["sentences"][0].get("markup").is_none());
        assert_eq!(sect["pages"][0]["sentences"][1]["array"][1]["text"], "King Herod");
        assert_eq!(sect["footnotes"][1]["order"], 1);
        assert_eq!(sect["annotations"][0]["labels"][0], "TITLE");
        assert_eq!(sect["annotations"][0]["languageCode"], "en");

        let reparsed = parse_json_tree(&json).unwrap();
        let rebuilt = apply_annotations(&reparsed, &reparsed.file.sect.annotations.clone()).unwrap();
        assert_eq!(rebuilt, tree);
    }

    #[test]
    fn test_parse_rejects_missing_envelope() {
        assert!(parse_json_tree(r#"{"file": {}}"#).is_err());
        assert!(parse_json_tree("not json").is_err());
    }
}
