//! Overlap resolution and nested tag wrapping for entity annotations
//!
//! Offsets are character indices into the plain sentence text. Wrapping
//! splices tags right-to-left over a token buffer in which every tag counts
//! as a single token, so the offset bookkeeping does not depend on how long
//! the rendered tags are.

use crate::model::EntityAnnotation;
use quick_xml::escape::escape;
use std::cmp::Ordering;

/// Which side of a partial overlap keeps its full extent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// The right-hand annotation is kept; the left one is cut at its start
    #[default]
    KeepRight,
    /// The left-hand annotation is kept; the right one starts at its end
    KeepLeft,
}

/// Copy of `annotation` restricted to `[start, end)`, with its text cut to match
fn slice(annotation: &EntityAnnotation, start: usize, end: usize) -> EntityAnnotation {
    let skip = start.saturating_sub(annotation.start);
    let take = end.saturating_sub(start);
    EntityAnnotation {
        start,
        end,
        text: annotation.text.chars().skip(skip).take(take).collect(),
        labels: annotation.labels.clone(),
        id: annotation.id.clone(),
    }
}

fn ascending(a: &EntityAnnotation, b: &EntityAnnotation) -> Ordering {
    a.start
        .cmp(&b.start)
        .then(b.end.cmp(&a.end))
        .then_with(|| a.labels.cmp(&b.labels))
}

/// `left` starts first and `right` crosses its end
fn crosses(left: &EntityAnnotation, right: &EntityAnnotation) -> bool {
    left.start < right.start && right.start < left.end && left.end < right.end
}

/// First crossing pair in ascending order, as indices into `annotations`
fn first_crossing(annotations: &[EntityAnnotation]) -> Option<(usize, usize)> {
    let mut order: Vec<usize> = (0..annotations.len()).collect();
    order.sort_by(|&a, &b| ascending(&annotations[a], &annotations[b]));

    order.iter().enumerate().find_map(|(n, &left)| {
        order[n + 1..]
            .iter()
            .find(|&&right| crosses(&annotations[left], &annotations[right]))
            .map(|&right| (left, right))
    })
}

/// Splits partially overlapping annotations so no two of them cross
///
/// Repeatedly takes the first crossing pair in ascending order and splits
/// the policy side at the other's boundary: the piece outside stays in
/// place and the piece inside is appended as a fragment carrying the split
/// annotation's labels. Disjoint and nested annotations are left alone.
/// Every split shortens an annotation and only cuts at existing
/// boundaries, so the loop ends; afterwards any two annotations are either
/// disjoint or nested.
///
/// # Returns
///
/// The (possibly truncated) input annotations followed by the fragments,
/// stably sorted by ascending `start`
pub fn resolve_overlap(
    annotations: &[EntityAnnotation],
    policy: OverlapPolicy,
) -> Vec<EntityAnnotation> {
    let mut resolved = annotations.to_vec();

    while let Some((left, right)) = first_crossing(&resolved) {
        let (l, r) = (&resolved[left], &resolved[right]);
        match policy {
            OverlapPolicy::KeepRight => {
                let fragment = slice(l, r.start, l.end);
                resolved[left] = slice(l, l.start, r.start);
                resolved.push(fragment);
            }
            OverlapPolicy::KeepLeft => {
                let fragment = slice(r, r.start, l.end);
                resolved[right] = slice(r, l.end, r.end);
                resolved.push(fragment);
            }
        }
    }

    resolved.sort_by_key(|a| a.start);
    resolved
}

enum Token {
    Char(char),
    Open(usize),
    Close(usize),
}

struct Tags {
    open: String,
    close: String,
}

fn build_tags(annotation: &EntityAnnotation, escape_attributes: bool) -> Option<Tags> {
    let label = annotation.primary_label()?;
    let open = match &annotation.id {
        Some(id) if escape_attributes => format!("<{label} ID=\"{}\">", escape(id.as_str())),
        Some(id) => format!("<{label} ID=\"{id}\">"),
        None => format!("<{label}>"),
    };
    Some(Tags {
        open,
        close: format!("</{label}>"),
    })
}

fn wrap(text: &str, annotations: &[EntityAnnotation], escape_text: bool) -> String {
    let resolved = resolve_overlap(annotations, OverlapPolicy::KeepRight);

    let mut ordered: Vec<(usize, usize, Tags)> = resolved
        .iter()
        .filter(|a| a.start <= a.end)
        .filter_map(|a| build_tags(a, escape_text).map(|tags| (a.start, a.end, tags)))
        .collect();

    // Right to left, longer span first on equal starts
    ordered.sort_by(|a, b| b.0.cmp(&a.0).then((b.1 - b.0).cmp(&(a.1 - a.0))));

    let mut spans: Vec<(usize, usize)> = ordered.iter().map(|(s, e, _)| (*s, *e)).collect();

    // Each tag is one token: an outer annotation's opening tag shifts a
    // nested one by one, and both of a nested annotation's tags extend an
    // enclosing one by two.
    for i in 0..spans.len() {
        let (cur_start, cur_end) = spans[i];
        for next in spans.iter_mut().skip(i + 1) {
            let (start, end) = *next;
            if start >= cur_start && end <= cur_end && start < cur_end {
                *next = (start + 1, end + 1);
            } else if start <= cur_start && end >= cur_end && start < cur_end {
                *next = (start, end + 2);
            }
        }
    }

    let mut tokens: Vec<Token> = text.chars().map(Token::Char).collect();
    for (index, (start, end)) in spans.iter().enumerate() {
        let end = (*end).min(tokens.len());
        let start = (*start).min(end);
        tokens.insert(end, Token::Close(index));
        tokens.insert(start, Token::Open(index));
    }

    let mut out = String::with_capacity(text.len());
    for token in tokens {
        match token {
            Token::Char(c) if escape_text => match c {
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '&' => out.push_str("&amp;"),
                c => out.push(c),
            },
            Token::Char(c) => out.push(c),
            Token::Open(i) => out.push_str(&ordered[i].2.open),
            Token::Close(i) => out.push_str(&ordered[i].2.close),
        }
    }
    out
}

/// Wraps every annotated span of `text` in `<LABEL>`…`</LABEL>` tags
///
/// Overlaps are resolved with [`OverlapPolicy::KeepRight`] first, so the
/// result is always properly nested. An empty annotation list returns the
/// text unchanged.
pub fn wrap_labels(text: &str, annotations: &[EntityAnnotation]) -> String {
    if annotations.is_empty() {
        return text.to_string();
    }
    wrap(text, annotations, false)
}

/// Same as [`wrap_labels`] but with the sentence text and tag attributes
/// XML-escaped, ready to embed in an XML element
pub fn wrap_labels_escaped(text: &str, annotations: &[EntityAnnotation]) -> String {
    if annotations.is_empty() {
        return escape(text).into_owned();
    }
    wrap(text, annotations, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityLabel;
    use regex::Regex;

    const TEXT: &str = "The quick brown fox jumps over the lazy dog.";

    fn ann(start: usize, end: usize, label: EntityLabel, id: &str) -> EntityAnnotation {
        let text: String = TEXT.chars().skip(start).take(end - start).collect();
        EntityAnnotation::new(start, end, text, label).with_id(id)
    }

    #[test]
    fn test_resolve_non_overlapping_sorted() {
        let input = vec![
            ann(10, 15, EntityLabel::Org, "3"),
            ann(0, 3, EntityLabel::Per, "1"),
            ann(4, 9, EntityLabel::Loc, "2"),
        ];
        let result = resolve_overlap(&input, OverlapPolicy::KeepRight);
        assert_eq!(
            result,
            vec![
                ann(0, 3, EntityLabel::Per, "1"),
                ann(4, 9, EntityLabel::Loc, "2"),
                ann(10, 15, EntityLabel::Org, "3"),
            ]
        );
    }

    #[test]
    fn test_resolve_keep_right() {
        let input = vec![
            ann(4, 19, EntityLabel::Loc, "2"),
            ann(10, 25, EntityLabel::Org, "3"),
        ];
        let result = resolve_overlap(&input, OverlapPolicy::KeepRight);

        assert_eq!(result.len(), 3);
        assert_eq!(result[0], ann(4, 10, EntityLabel::Loc, "2"));
        assert_eq!(result[0].text, "quick ");
        assert_eq!(result[1], ann(10, 25, EntityLabel::Org, "3"));
        assert_eq!(result[2], ann(10, 19, EntityLabel::Loc, "2"));
        assert_eq!(result[2].text, "brown fox");
    }

    #[test]
    fn test_resolve_keep_left() {
        let input = vec![
            ann(4, 19, EntityLabel::Loc, "2"),
            ann(10, 25, EntityLabel::Org, "3"),
        ];
        let result = resolve_overlap(&input, OverlapPolicy::KeepLeft);

        assert_eq!(result.len(), 3);
        assert_eq!(result[0], ann(4, 19, EntityLabel::Loc, "2"));
        assert_eq!(result[1], ann(10, 19, EntityLabel::Org, "3"));
        assert_eq!(result[2], ann(19, 25, EntityLabel::Org, "3"));
        assert_eq!(result[2].text, " jumps");
    }

    #[test]
    fn test_resolve_contained_untouched() {
        let input = vec![
            ann(4, 25, EntityLabel::Loc, "2"),
            ann(10, 19, EntityLabel::Org, "3"),
        ];
        assert_eq!(resolve_overlap(&input, OverlapPolicy::KeepRight), input);

        // Same start, shorter one inside
        let input = vec![
            ann(4, 9, EntityLabel::Org, "3"),
            ann(4, 19, EntityLabel::Loc, "2"),
        ];
        let result = resolve_overlap(&input, OverlapPolicy::KeepRight);
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|a| !a.is_empty()));
    }

    #[test]
    fn test_resolve_trivial_inputs() {
        assert!(resolve_overlap(&[], OverlapPolicy::KeepRight).is_empty());
        let single = vec![ann(0, 5, EntityLabel::Per, "1")];
        assert_eq!(resolve_overlap(&single, OverlapPolicy::KeepRight), single);
    }

    #[test]
    fn test_resolve_triple_chain() {
        let input = vec![
            ann(0, 10, EntityLabel::Per, "a"),
            ann(5, 15, EntityLabel::Loc, "b"),
            ann(12, 20, EntityLabel::Org, "c"),
        ];
        let result = resolve_overlap(&input, OverlapPolicy::KeepRight);
        let spans: Vec<(usize, usize, &str)> = result
            .iter()
            .map(|a| (a.start, a.end, a.id.as_deref().unwrap_or("")))
            .collect();
        assert_eq!(
            spans,
            vec![(0, 5, "a"), (5, 12, "b"), (5, 10, "a"), (12, 20, "c"), (12, 15, "b")]
        );
    }

    fn on(text: &str, start: usize, end: usize, label: EntityLabel) -> EntityAnnotation {
        let span: String = text.chars().skip(start).take(end - start).collect();
        EntityAnnotation::new(start, end, span, label)
    }

    fn spans(result: &[EntityAnnotation]) -> Vec<(usize, usize, EntityLabel)> {
        result
            .iter()
            .map(|a| (a.start, a.end, a.labels[0]))
            .collect()
    }

    fn assert_no_crossing(result: &[EntityAnnotation]) {
        for a in result {
            for b in result {
                assert!(!crosses(a, b), "{a:?} partially overlaps {b:?}");
            }
        }
    }

    /// Tags balance like parentheses and removing them restores `text`
    fn assert_well_nested(wrapped: &str, text: &str) {
        let tag = Regex::new(r"<(/?)([A-Z_]+)[^>]*>").unwrap();
        let mut stack = Vec::new();
        for caps in tag.captures_iter(wrapped) {
            if caps[1].is_empty() {
                stack.push(caps[2].to_string());
            } else {
                assert_eq!(stack.pop().as_deref(), Some(&caps[2]), "crossed tags in {wrapped}");
            }
        }
        assert!(stack.is_empty(), "unclosed tags in {wrapped}");
        assert_eq!(tag.replace_all(wrapped, ""), text);
    }

    #[test]
    fn test_resolve_scenario_keep_right() {
        let text = "0123456789abcdefghijklmnopq";
        let input = vec![
            on(text, 0, 15, EntityLabel::Loc),
            on(text, 10, 25, EntityLabel::Org),
        ];
        let result = resolve_overlap(&input, OverlapPolicy::KeepRight);
        assert_eq!(
            spans(&result),
            vec![
                (0, 10, EntityLabel::Loc),
                (10, 25, EntityLabel::Org),
                (10, 15, EntityLabel::Loc),
            ]
        );
    }

    #[test]
    fn test_resolved_texts_rebuild_union() {
        let input = vec![
            ann(4, 19, EntityLabel::Loc, "2"),
            ann(10, 25, EntityLabel::Org, "3"),
        ];
        for policy in [OverlapPolicy::KeepRight, OverlapPolicy::KeepLeft] {
            let result = resolve_overlap(&input, policy);

            for a in &result {
                let expected: String = TEXT.chars().skip(a.start).take(a.end - a.start).collect();
                assert_eq!(a.text, expected);
            }

            // Outermost fragments, in order, cover the union exactly once
            let outer: String = result
                .iter()
                .filter(|a| {
                    !result.iter().any(|b| {
                        b != *a && b.start <= a.start && a.end <= b.end && b.len() > a.len()
                    })
                })
                .map(|a| a.text.as_str())
                .collect();
            assert_eq!(outer, "quick brown fox jumps");
        }
    }

    #[test]
    fn test_resolve_crossing_past_nested_span() {
        let text = "abcdefghijklmnop";
        let input = vec![
            on(text, 0, 10, EntityLabel::Per),
            on(text, 2, 4, EntityLabel::Loc),
            on(text, 3, 12, EntityLabel::Org),
        ];
        let result = resolve_overlap(&input, OverlapPolicy::KeepRight);
        assert_no_crossing(&result);
        assert_eq!(
            spans(&result),
            vec![
                (0, 2, EntityLabel::Per),
                (2, 3, EntityLabel::Loc),
                (2, 3, EntityLabel::Per),
                (3, 12, EntityLabel::Org),
                (3, 10, EntityLabel::Per),
                (3, 4, EntityLabel::Loc),
            ]
        );
        assert_well_nested(&wrap_labels(text, &input), text);
    }

    #[test]
    fn test_resolution_always_nests() {
        use EntityLabel::{Loc, Org, Per, Title};
        let cases: Vec<Vec<(usize, usize, EntityLabel)>> = vec![
            vec![(0, 10, Per), (5, 15, Loc), (12, 20, Org)],
            vec![(0, 10, Per), (2, 4, Loc), (3, 12, Org)],
            vec![(0, 20, Per), (5, 25, Loc), (10, 30, Org), (15, 35, Title)],
            vec![(4, 25, Loc), (10, 19, Org), (15, 30, Per), (0, 12, Title)],
            vec![(0, 44, Per), (0, 3, Loc), (1, 9, Org), (8, 9, Title), (8, 20, Loc)],
            vec![(4, 9, Org), (4, 9, Loc), (6, 15, Per)],
        ];

        for case in cases {
            let input: Vec<_> = case.iter().map(|&(s, e, l)| on(TEXT, s, e, l)).collect();
            for policy in [OverlapPolicy::KeepRight, OverlapPolicy::KeepLeft] {
                let result = resolve_overlap(&input, policy);
                assert_no_crossing(&result);
                assert!(result.windows(2).all(|w| w[0].start <= w[1].start));
                assert!(result.iter().all(|a| a.start < a.end));
            }
            assert_well_nested(&wrap_labels(TEXT, &input), TEXT);
            assert_well_nested(&wrap_labels_escaped(TEXT, &input), TEXT);
        }
    }

    #[test]
    fn test_resolved_spans_never_partially_overlap() {
        let input = vec![
            ann(4, 19, EntityLabel::Loc, "2"),
            ann(10, 25, EntityLabel::Org, "3"),
            ann(0, 3, EntityLabel::Per, "1"),
        ];
        let result = resolve_overlap(&input, OverlapPolicy::KeepRight);
        for a in &result {
            for b in &result {
                let overlap = a.start < b.end && b.start < a.end;
                let nested = (a.start >= b.start && a.end <= b.end)
                    || (b.start >= a.start && b.end <= a.end);
                assert!(!overlap || nested, "{a:?} partially overlaps {b:?}");
            }
        }
    }

    #[test]
    fn test_wrap_non_overlapping() {
        let anns = vec![
            ann(0, 3, EntityLabel::Per, "1"),
            ann(4, 9, EntityLabel::Loc, "2"),
            ann(10, 15, EntityLabel::Org, "3"),
        ];
        assert_eq!(
            wrap_labels(TEXT, &anns),
            "<PER ID=\"1\">The</PER> <LOC ID=\"2\">quick</LOC> <ORG ID=\"3\">brown</ORG> fox jumps over the lazy dog."
        );
    }

    #[test]
    fn test_wrap_overlapping() {
        let anns = vec![
            ann(0, 3, EntityLabel::Per, "1"),
            ann(4, 19, EntityLabel::Loc, "2"),
            ann(10, 25, EntityLabel::Org, "3"),
        ];
        assert_eq!(
            wrap_labels(TEXT, &anns),
            "<PER ID=\"1\">The</PER> <LOC ID=\"2\">quick </LOC><ORG ID=\"3\"><LOC ID=\"2\">brown fox</LOC> jumps</ORG> over the lazy dog."
        );
    }

    #[test]
    fn test_wrap_contained() {
        let anns = vec![
            ann(0, 3, EntityLabel::Per, "1"),
            ann(4, 25, EntityLabel::Loc, "2"),
            ann(10, 19, EntityLabel::Org, "3"),
        ];
        assert_eq!(
            wrap_labels(TEXT, &anns),
            "<PER ID=\"1\">The</PER> <LOC ID=\"2\">quick <ORG ID=\"3\">brown fox</ORG> jumps</LOC> over the lazy dog."
        );
    }

    #[test]
    fn test_wrap_same_start_nests_longer_outside() {
        let anns = vec![
            ann(4, 9, EntityLabel::Org, "3"),
            ann(4, 15, EntityLabel::Loc, "2"),
        ];
        assert_eq!(
            wrap_labels(TEXT, &anns),
            "The <LOC ID=\"2\"><ORG ID=\"3\">quick</ORG> brown</LOC> fox jumps over the lazy dog."
        );
    }

    #[test]
    fn test_wrap_scenario() {
        let anns = vec![EntityAnnotation::new(0, 3, "The", EntityLabel::Per)];
        assert_eq!(wrap_labels("The quick", &anns), "<PER>The</PER> quick");
    }

    #[test]
    fn test_wrap_empty_is_identity() {
        assert_eq!(wrap_labels(TEXT, &[]), TEXT);
    }

    #[test]
    fn test_wrap_single_without_id() {
        let anns = vec![EntityAnnotation::new(0, 5, "Hello", EntityLabel::Per)];
        assert_eq!(wrap_labels("Hello world", &anns), "<PER>Hello</PER> world");
    }

    #[test]
    fn test_wrap_uses_character_offsets() {
        let text = "Đức Giê-su đến Ga-li-lê";
        let anns = vec![
            EntityAnnotation::new(0, 10, "Đức Giê-su", EntityLabel::Per),
            EntityAnnotation::new(15, 23, "Ga-li-lê", EntityLabel::Loc),
        ];
        assert_eq!(
            wrap_labels(text, &anns),
            "<PER>Đức Giê-su</PER> đến <LOC>Ga-li-lê</LOC>"
        );
    }

    #[test]
    fn test_wrap_escaped() {
        let text = "A & B <said>";
        let anns = vec![EntityAnnotation::new(0, 1, "A", EntityLabel::Per).with_id("x\"1")];
        assert_eq!(
            wrap_labels_escaped(text, &anns),
            "<PER ID=\"x&quot;1\">A</PER> &amp; B &lt;said&gt;"
        );
        assert_eq!(wrap_labels_escaped("a<b", &[]), "a&lt;b");
    }
}
