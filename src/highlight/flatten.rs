//! Flat-text indexing: one container's text leaves -> a contiguous offset
//! coordinate system.
//!
//! Deep-mode matching runs over the concatenation of all text leaves under a
//! container, because a match may straddle what the tree sees as a leaf
//! boundary (for example the boundary a previous highlight pass introduced).
//! `FlatIndex` is the coordinate system tying "offset in concatenated text"
//! back to "offset in a specific leaf".
//!
//! Offsets are byte offsets; they come from the regex engine and therefore
//! always sit on character boundaries of the concatenated text.

use crate::dom::{Document, NodeId};

/// One text leaf's slot in the flattened coordinate space.
///
/// Mappings are strictly increasing and contiguous:
/// `mapping[i].end() == mapping[i + 1].start`.
#[derive(Debug, Clone)]
pub struct TextMapping {
    pub leaf: NodeId,
    pub start: usize,
    pub len: usize,
    /// Whether the leaf's structural parent already carries the instance's
    /// marker class (deep-mode double-highlight guard).
    pub marked: bool,
}

impl TextMapping {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// The flattened view of one container: mappings plus the concatenated text.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    mappings: Vec<TextMapping>,
    text: String,
}

impl FlatIndex {
    /// Walk `container`'s text leaves in document order and build the index.
    /// Leaves that are empty or whitespace-only are rejected during the walk
    /// and do not occupy offsets.
    pub fn build(doc: &Document, container: NodeId, marker_class: &str) -> FlatIndex {
        let leaves = doc.text_nodes_under(container, |d, n| !d.text(n).trim().is_empty());
        let mut mappings = Vec::with_capacity(leaves.len());
        let mut text = String::new();
        for leaf in leaves {
            let content = doc.text(leaf);
            let marked = doc
                .parent(leaf)
                .map(|p| doc.has_class(p, marker_class))
                .unwrap_or(false);
            mappings.push(TextMapping {
                leaf,
                start: text.len(),
                len: content.len(),
                marked,
            });
            text.push_str(content);
        }
        FlatIndex { mappings, text }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn mappings(&self) -> &[TextMapping] {
        &self.mappings
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Index of the mapping whose `[start, end)` interval contains `offset`.
    /// Mapping boundaries are contiguous and sorted, so this is a plain
    /// binary search for the containing interval.
    pub fn mapping_index_at(&self, offset: usize) -> Option<usize> {
        if self.mappings.is_empty() {
            return None;
        }
        let mut lo = 0usize;
        let mut hi = self.mappings.len();
        while lo < hi {
            let mid = (lo + hi) / 2;
            let m = &self.mappings[mid];
            if offset < m.start {
                hi = mid;
            } else if offset >= m.end() {
                lo = mid + 1;
            } else {
                return Some(mid);
            }
        }
        None
    }

    pub fn mapping_at(&self, offset: usize) -> Option<&TextMapping> {
        self.mapping_index_at(offset).map(|i| &self.mappings[i])
    }
}

// =============================================================================
// Tests
// =============================================================================
