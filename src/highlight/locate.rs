//! Match location: run the pattern over one text, produce ordered,
//! non-overlapping match spans.
//!
//! The same routine serves both modes: deep mode hands it the container's
//! concatenated text, shallow mode hands it one leaf's text. Spans are the
//! capture-group slice when the pattern has one (built patterns always do),
//! otherwise the whole match.

use regex::Regex;

use super::flatten::FlatIndex;

/// A half-open `[start, end)` match range in some coordinate space,
/// `start < end` always.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
}

/// Repeated pattern execution with an advancing cursor.
///
/// A zero-length match never loops: the cursor advances past it by one
/// character and the empty match yields no span (there is nothing to wrap).
pub fn locate_matches(re: &Regex, text: &str) -> Vec<MatchSpan> {
    let mut spans = Vec::new();
    let mut pos = 0usize;
    while pos <= text.len() {
        let Some(caps) = re.captures_at(text, pos) else {
            break;
        };
        let whole = caps.get(0).expect("group 0 always present");
        if whole.start() == whole.end() {
            pos = next_char_boundary(text, whole.start());
            continue;
        }
        let group = caps
            .get(1)
            .filter(|g| g.start() < g.end())
            .unwrap_or(whole);
        spans.push(MatchSpan {
            start: group.start(),
            end: group.end(),
        });
        pos = whole.end();
    }
    spans
}

fn next_char_boundary(text: &str, from: usize) -> usize {
    let mut i = from + 1;
    while i < text.len() && !text.is_char_boundary(i) {
        i += 1;
    }
    i
}

/// Deep-mode double-highlight guard.
///
/// A candidate whose start falls strictly inside an already-marked leaf
/// (and not exactly at that leaf's own start) is discarded, and likewise a
/// candidate whose end falls strictly inside an already-marked leaf whose
/// end is not exactly that leaf's end. Partially re-wrapping an existing
/// marker would produce overlapping markers with ambiguous ownership; a new
/// match may only touch a marked leaf at that leaf's exact boundary.
pub fn passes_marked_guard(index: &FlatIndex, span: &MatchSpan) -> bool {
    let Some(first) = index.mapping_at(span.start) else {
        return false;
    };
    if first.marked && span.start != first.start {
        return false;
    }
    let Some(last) = index.mapping_at(span.end - 1) else {
        return false;
    };
    if last.marked && span.end != last.end() {
        return false;
    }
    true
}

// =============================================================================
// Tests
// =============================================================================
