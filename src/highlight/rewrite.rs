//! Range rewriting: turn match spans into marker elements in the tree.
//!
//! Two rewrite strategies behind the same marker shape:
//! - deep: spans live in the container's flattened coordinate space and may
//!   cover several leaves; every span is resolved to concrete
//!   (leaf, local-range) segments *before* any mutation, then segments are
//!   applied in one backward pass so earlier offsets stay valid
//! - shallow: spans are leaf-local; the leaf's text is rebuilt as a markup
//!   string with marker tags around each matched slice, parsed back into
//!   nodes, and spliced over the original leaf
//!
//! Wrapping never duplicates or drops characters: total text content of a
//! container is invariant across a highlight pass. A cross-leaf span yields
//! one fresh marker per underlying leaf segment; markers are never merged
//! across original leaf boundaries.

use quick_xml::escape::{escape, partial_escape};
use regex::Regex;

use crate::dom::{Document, NodeId};

use super::flatten::FlatIndex;
use super::locate::{locate_matches, MatchSpan};

/// The marker shape a highlighter instance stamps onto wrapped text.
#[derive(Debug, Clone)]
pub struct MarkerSpec {
    pub tag: String,
    pub class: String,
    pub instance_attr: String,
    pub instance_id: u64,
}

impl MarkerSpec {
    /// Create a marker element owning one text node.
    pub fn create(&self, doc: &mut Document, content: &str) -> NodeId {
        let el = doc.create_element(&self.tag);
        doc.set_attr(el, "class", &self.class);
        doc.set_attr(el, &self.instance_attr, &self.instance_id.to_string());
        let text = doc.create_text(content);
        doc.append_child(el, text);
        el
    }

    fn open_tag(&self) -> String {
        format!(
            r#"<{} class="{}" {}="{}">"#,
            self.tag,
            escape(self.class.as_str()),
            self.instance_attr,
            self.instance_id
        )
    }

    fn close_tag(&self) -> String {
        format!("</{}>", self.tag)
    }
}

/// One contiguous slice of a single leaf covered by a match,
/// local byte offsets.
#[derive(Debug, Clone, Copy)]
struct Segment {
    leaf: NodeId,
    start: usize,
    end: usize,
}

/// Map a flat-coordinate span to per-leaf segments. `None` when a boundary
/// cannot be resolved to any mapping (the container's text changed between
/// indexing and rewriting) — the caller skips such spans silently.
fn resolve_span(index: &FlatIndex, span: &MatchSpan) -> Option<Vec<Segment>> {
    if span.start >= span.end {
        return None;
    }
    let first = index.mapping_index_at(span.start)?;
    let last = index.mapping_index_at(span.end - 1)?;
    let mut segments = Vec::with_capacity(last - first + 1);
    for mapping in &index.mappings()[first..=last] {
        let start = span.start.max(mapping.start) - mapping.start;
        let end = span.end.min(mapping.end()) - mapping.start;
        if start < end {
            segments.push(Segment {
                leaf: mapping.leaf,
                start,
                end,
            });
        }
    }
    Some(segments)
}

/// Apply deep-mode spans to the tree. Returns (spans applied, spans skipped
/// as unresolvable). Markers created = sum of segment counts.
pub fn apply_spans_deep(
    doc: &mut Document,
    index: &FlatIndex,
    spans: &[MatchSpan],
    marker: &MarkerSpec,
) -> (usize, usize) {
    // Resolve everything against the still-unmutated tree first.
    let mut resolved = Vec::with_capacity(spans.len());
    let mut skipped = 0usize;
    for span in spans {
        match resolve_span(index, span) {
            Some(segments) if !segments.is_empty() => resolved.push(segments),
            _ => skipped += 1,
        }
    }

    // Backward pass: mutating a later position never invalidates an earlier
    // one, and a leaf shared by two spans keeps its id because the split
    // leaves the original node in place as the `before` remainder.
    let mut emptied: Vec<NodeId> = Vec::new();
    for segments in resolved.iter().rev() {
        for segment in segments.iter().rev() {
            wrap_segment(doc, segment, marker, &mut emptied);
        }
    }
    for leaf in emptied {
        if doc.text(leaf).is_empty() {
            doc.detach(leaf);
        }
    }
    (resolved.len(), skipped)
}

fn wrap_segment(doc: &mut Document, seg: &Segment, marker: &MarkerSpec, emptied: &mut Vec<NodeId>) {
    let full = doc.text(seg.leaf).to_string();
    if seg.end > full.len()
        || !full.is_char_boundary(seg.start)
        || !full.is_char_boundary(seg.end)
    {
        // leaf no longer matches the coordinates; skip, never partially apply
        return;
    }
    let before = &full[..seg.start];
    let matched = &full[seg.start..seg.end];
    let after = &full[seg.end..];

    let marker_el = marker.create(doc, matched);
    let mut inserted = vec![marker_el];
    if !after.is_empty() {
        let tail = doc.create_text(after);
        inserted.push(tail);
    }
    // The original leaf survives as the `before` remainder so earlier spans
    // targeting this leaf stay addressable; empties are collected and only
    // dropped once every span has been applied.
    doc.set_text(seg.leaf, before);
    doc.insert_after(seg.leaf, inserted);
    if before.is_empty() {
        emptied.push(seg.leaf);
    }
}

/// Shallow rewrite of one leaf: match against this leaf's text alone, build
/// substitute markup around the matched slices, parse it back and replace
/// the leaf. Returns the number of matches wrapped.
pub fn rewrite_leaf_shallow(
    doc: &mut Document,
    leaf: NodeId,
    re: &Regex,
    marker: &MarkerSpec,
) -> usize {
    let text = doc.text(leaf).to_string();
    let spans = locate_matches(re, &text);
    if spans.is_empty() {
        return 0;
    }
    let mut markup = String::new();
    let mut last = 0usize;
    for span in &spans {
        markup.push_str(&partial_escape(&text[last..span.start]));
        markup.push_str(&marker.open_tag());
        markup.push_str(&partial_escape(&text[span.start..span.end]));
        markup.push_str(&marker.close_tag());
        last = span.end;
    }
    markup.push_str(&partial_escape(&text[last..]));

    let Ok(nodes) = doc.parse_fragment(&markup) else {
        // malformed marker configuration; leave the leaf untouched
        return 0;
    };
    if !doc.replace_with(leaf, nodes) {
        return 0;
    }
    spans.len()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, Selector};
    use crate::highlight::pattern::{build_pattern, Pattern};

    fn marker() -> MarkerSpec {
        MarkerSpec {
            tag: "span".to_string(),
            class: "highlight-text".to_string(),
            instance_attr: "data-highlighter-instance".to_string(),
            instance_id: 7,
        }
    }

    fn markers_in(doc: &Document) -> Vec<NodeId> {
        doc.select(&Selector::for_class("highlight-text").unwrap())
    }

    #[test]
    fn test_single_leaf_match_splits_before_after() {
        let mut doc = Document::parse("<div>say hello now</div>").unwrap();
        let div = doc.children(doc.root())[0];
        let index = FlatIndex::build(&doc, div, "highlight-text");
        let spans = vec![MatchSpan { start: 4, end: 9 }];
        let (applied, skipped) = apply_spans_deep(&mut doc, &index, &spans, &marker());
        assert_eq!((applied, skipped), (1, 0));
        assert_eq!(doc.text_of(div), "say hello now");
        let found = markers_in(&doc);
        assert_eq!(found.len(), 1);
        assert_eq!(doc.text_of(found[0]), "hello");
        assert_eq!(doc.attr(found[0], "data-highlighter-instance"), Some("7"));
        // before and after remain plain text siblings
        assert_eq!(doc.children(div).len(), 3);
    }

    #[test]
    fn test_match_at_leaf_start_leaves_no_empty_text() {
        let mut doc = Document::parse("<div>hello now</div>").unwrap();
        let div = doc.children(doc.root())[0];
        let index = FlatIndex::build(&doc, div, "highlight-text");
        let spans = vec![MatchSpan { start: 0, end: 5 }];
        apply_spans_deep(&mut doc, &index, &spans, &marker());
        assert_eq!(doc.text_of(div), "hello now");
        // [marker, " now"] - the emptied original leaf was dropped
        assert_eq!(doc.children(div).len(), 2);
        assert!(doc.is_element(doc.children(div)[0]));
    }

    #[test]
    fn test_cross_leaf_match_yields_adjacent_separate_markers() {
        let mut doc = Document::parse("<div><b>Hel</b>lo World</div>").unwrap();
        let div = doc.children(doc.root())[0];
        let index = FlatIndex::build(&doc, div, "highlight-text");
        assert_eq!(index.text(), "Hello World");
        let spans = vec![MatchSpan { start: 0, end: 5 }]; // "Hello"
        let (applied, _) = apply_spans_deep(&mut doc, &index, &spans, &marker());
        assert_eq!(applied, 1);
        let found = markers_in(&doc);
        // one marker per underlying leaf segment, never merged
        assert_eq!(found.len(), 2);
        assert_eq!(doc.text_of(found[0]), "Hel");
        assert_eq!(doc.text_of(found[1]), "lo");
        assert_eq!(doc.text_of(div), "Hello World");
        // the first marker lives inside <b>, the second under the div
        let b = doc.select(&Selector::parse("b").unwrap())[0];
        assert_eq!(doc.parent(found[0]), Some(b));
        assert_eq!(doc.parent(found[1]), Some(div));
    }

    #[test]
    fn test_multiple_spans_in_one_leaf_apply_backward_safely() {
        let mut doc = Document::parse("<div>ha ha ha</div>").unwrap();
        let div = doc.children(doc.root())[0];
        let index = FlatIndex::build(&doc, div, "highlight-text");
        let spans = vec![
            MatchSpan { start: 0, end: 2 },
            MatchSpan { start: 3, end: 5 },
            MatchSpan { start: 6, end: 8 },
        ];
        let (applied, skipped) = apply_spans_deep(&mut doc, &index, &spans, &marker());
        assert_eq!((applied, skipped), (3, 0));
        assert_eq!(doc.text_of(div), "ha ha ha");
        assert_eq!(markers_in(&doc).len(), 3);
    }

    #[test]
    fn test_unresolvable_span_skipped_others_proceed() {
        let mut doc = Document::parse("<div>hello</div>").unwrap();
        let div = doc.children(doc.root())[0];
        let index = FlatIndex::build(&doc, div, "highlight-text");
        let spans = vec![
            MatchSpan { start: 0, end: 5 },
            MatchSpan { start: 40, end: 45 }, // beyond the text
        ];
        let (applied, skipped) = apply_spans_deep(&mut doc, &index, &spans, &marker());
        assert_eq!((applied, skipped), (1, 1));
        assert_eq!(markers_in(&doc).len(), 1);
        assert_eq!(doc.text_of(div), "hello");
    }

    #[test]
    fn test_character_count_invariant_over_deep_rewrite() {
        let mut doc =
            Document::parse("<div>one <b>two</b> three <i>fo</i>ur five</div>").unwrap();
        let div = doc.children(doc.root())[0];
        let before = doc.char_count(div);
        let index = FlatIndex::build(&doc, div, "highlight-text");
        let re = build_pattern(Pattern::Term("four".to_string()), false).unwrap();
        let spans = locate_matches(&re, index.text());
        assert_eq!(spans.len(), 1);
        apply_spans_deep(&mut doc, &index, &spans, &marker());
        assert_eq!(doc.char_count(div), before);
        assert_eq!(markers_in(&doc).len(), 2); // "fo" + "ur"
    }

    #[test]
    fn test_shallow_rewrite_wraps_within_one_leaf() {
        let mut doc = Document::parse("<div>Hello World! hello</div>").unwrap();
        let div = doc.children(doc.root())[0];
        let leaf = doc.children(div)[0];
        let re = build_pattern(Pattern::Term("hello".to_string()), false).unwrap();
        let wrapped = rewrite_leaf_shallow(&mut doc, leaf, &re, &marker());
        assert_eq!(wrapped, 2);
        assert_eq!(doc.text_of(div), "Hello World! hello");
        let found = markers_in(&doc);
        assert_eq!(found.len(), 2);
        assert_eq!(doc.text_of(found[0]), "Hello");
        assert_eq!(doc.text_of(found[1]), "hello");
    }

    #[test]
    fn test_shallow_rewrite_escapes_markup_sensitive_text() {
        let mut doc = Document::parse("<div>1 &lt; 2 &amp; hello</div>").unwrap();
        let div = doc.children(doc.root())[0];
        let leaf = doc.children(div)[0];
        let re = build_pattern(Pattern::Term("hello".to_string()), false).unwrap();
        assert_eq!(rewrite_leaf_shallow(&mut doc, leaf, &re, &marker()), 1);
        assert_eq!(doc.text_of(div), "1 < 2 & hello");
    }

    #[test]
    fn test_shallow_rewrite_without_match_is_noop() {
        let mut doc = Document::parse("<div>nothing here</div>").unwrap();
        let div = doc.children(doc.root())[0];
        let leaf = doc.children(div)[0];
        let before = doc.to_html();
        let re = build_pattern(Pattern::Term("absent".to_string()), false).unwrap();
        assert_eq!(rewrite_leaf_shallow(&mut doc, leaf, &re, &marker()), 0);
        assert_eq!(doc.to_html(), before);
    }

    #[test]
    fn test_multibyte_segment_boundaries() {
        let mut doc = Document::parse("<div>héllo wörld</div>").unwrap();
        let div = doc.children(doc.root())[0];
        let index = FlatIndex::build(&doc, div, "highlight-text");
        let re = build_pattern(Pattern::Term("wörld".to_string()), false).unwrap();
        let spans = locate_matches(&re, index.text());
        let (applied, _) = apply_spans_deep(&mut doc, &index, &spans, &marker());
        assert_eq!(applied, 1);
        assert_eq!(doc.text_of(div), "héllo wörld");
        assert_eq!(doc.text_of(markers_in(&doc)[0]), "wörld");
    }
}
