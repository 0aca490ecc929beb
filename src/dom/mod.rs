//! Host document model: an arena-backed markup tree.
//!
//! The highlighter's entire job is mutating a document tree, so the crate
//! carries its own lightweight model instead of binding to a browser DOM:
//! - `Document` owns every node in a flat arena; `NodeId` is a stable index
//! - parsing/serialization live in `parse.rs` (quick-xml events in, escaped
//!   markup out)
//! - `select.rs` implements the selector subset used for container discovery
//!
//! Node identity survives any mutation: detached nodes stay in the arena and
//! simply lose their parent link. This is what lets the range rewriter keep
//! addressing a leaf it has already truncated.

pub mod parse;
pub mod select;

pub use select::Selector;

use thiserror::Error;

use crate::highlight::style::StyleRegistry;

// =============================================================================
// Errors
// =============================================================================

/// Errors from the document model. Highlight operations themselves never
/// fail; only parsing markup and parsing selectors can go wrong.
#[derive(Debug, Error)]
pub enum DomError {
    #[error("markup parse error: {0}")]
    Parse(String),
    #[error("invalid selector: {0}")]
    Selector(String),
}

// =============================================================================
// Nodes
// =============================================================================

/// Stable handle to a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) enum NodeData {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<NodeId>,
    },
    Text {
        content: String,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) data: NodeData,
}

// =============================================================================
// Document
// =============================================================================

/// A markup document: flat node arena plus a synthetic root element.
///
/// The root is never serialized; a parsed document's top-level nodes are the
/// root's children.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    styles: Option<StyleRegistry>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let root = Node {
            parent: None,
            data: NodeData::Element {
                tag: "#root".to_string(),
                attrs: Vec::new(),
                children: Vec::new(),
            },
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            styles: None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    // -------------------------------------------------------------------------
    // Node construction
    // -------------------------------------------------------------------------

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(Node {
            parent: None,
            data: NodeData::Element {
                tag: tag.to_string(),
                attrs: Vec::new(),
                children: Vec::new(),
            },
        })
    }

    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push(Node {
            parent: None,
            data: NodeData::Text {
                content: content.to_string(),
            },
        })
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].data, NodeData::Element { .. })
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].data, NodeData::Text { .. })
    }

    /// Tag name of an element, or `""` for text nodes.
    pub fn tag(&self, id: NodeId) -> &str {
        match &self.nodes[id.0].data {
            NodeData::Element { tag, .. } => tag,
            NodeData::Text { .. } => "",
        }
    }

    /// Content of a text node, or `""` for elements.
    pub fn text(&self, id: NodeId) -> &str {
        match &self.nodes[id.0].data {
            NodeData::Text { content } => content,
            NodeData::Element { .. } => "",
        }
    }

    pub fn set_text(&mut self, id: NodeId, new_content: &str) {
        if let NodeData::Text { content } = &mut self.nodes[id.0].data {
            content.clear();
            content.push_str(new_content);
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id.0].data {
            NodeData::Element { children, .. } => children,
            NodeData::Text { .. } => &[],
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            NodeData::Text { .. } => None,
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeData::Element { attrs, .. } = &mut self.nodes[id.0].data {
            if let Some(entry) = attrs.iter_mut().find(|(k, _)| k == name) {
                entry.1 = value.to_string();
            } else {
                attrs.push((name.to_string(), value.to_string()));
            }
        }
    }

    pub(crate) fn attrs(&self, id: NodeId) -> &[(String, String)] {
        match &self.nodes[id.0].data {
            NodeData::Element { attrs, .. } => attrs,
            NodeData::Text { .. } => &[],
        }
    }

    /// True if the element's `class` attribute contains `class_name`
    /// (whitespace-separated token match).
    pub fn has_class(&self, id: NodeId, class_name: &str) -> bool {
        self.attr(id, "class")
            .map(|c| c.split_whitespace().any(|t| t == class_name))
            .unwrap_or(false)
    }

    // -------------------------------------------------------------------------
    // Structural mutation
    // -------------------------------------------------------------------------

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        if let NodeData::Element { children, .. } = &mut self.nodes[parent.0].data {
            children.push(child);
        }
    }

    fn child_index(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children(parent).iter().position(|&c| c == child)
    }

    /// Detach a node from its parent. The node stays in the arena and can be
    /// re-inserted; an already-detached node is a no-op.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent {
            if let Some(idx) = self.child_index(parent, id) {
                if let NodeData::Element { children, .. } = &mut self.nodes[parent.0].data {
                    children.remove(idx);
                }
            }
            self.nodes[id.0].parent = None;
        }
    }

    /// Insert `nodes` as siblings immediately after `anchor`.
    /// Returns false (and does nothing) if the anchor has no parent.
    pub fn insert_after(&mut self, anchor: NodeId, nodes: Vec<NodeId>) -> bool {
        let Some(parent) = self.parent(anchor) else {
            return false;
        };
        let Some(idx) = self.child_index(parent, anchor) else {
            return false;
        };
        for &n in &nodes {
            self.nodes[n.0].parent = Some(parent);
        }
        if let NodeData::Element { children, .. } = &mut self.nodes[parent.0].data {
            children.splice(idx + 1..idx + 1, nodes);
        }
        true
    }

    /// Replace `old` with `nodes` at the same structural position.
    /// Returns false (and does nothing) if `old` has no parent.
    pub fn replace_with(&mut self, old: NodeId, nodes: Vec<NodeId>) -> bool {
        let Some(parent) = self.parent(old) else {
            return false;
        };
        let Some(idx) = self.child_index(parent, old) else {
            return false;
        };
        for &n in &nodes {
            self.nodes[n.0].parent = Some(parent);
        }
        self.nodes[old.0].parent = None;
        if let NodeData::Element { children, .. } = &mut self.nodes[parent.0].data {
            children.splice(idx..=idx, nodes);
        }
        true
    }

    /// Move all of an element's children out to occupy its former position,
    /// then drop the now-empty element. Returns false if it has no parent.
    pub fn unwrap(&mut self, el: NodeId) -> bool {
        let Some(parent) = self.parent(el) else {
            return false;
        };
        let Some(idx) = self.child_index(parent, el) else {
            return false;
        };
        let kids = self.children(el).to_vec();
        for &k in &kids {
            self.nodes[k.0].parent = Some(parent);
        }
        if let NodeData::Element { children, .. } = &mut self.nodes[el.0].data {
            children.clear();
        }
        self.nodes[el.0].parent = None;
        if let NodeData::Element { children, .. } = &mut self.nodes[parent.0].data {
            children.splice(idx..=idx, kids);
        }
        true
    }

    /// Merge adjacent text-node siblings and drop empty text nodes, recursively,
    /// so a plain-text scan reads identically to a never-highlighted tree.
    pub fn normalize(&mut self, el: NodeId) {
        let kids = self.children(el).to_vec();
        for k in &kids {
            if self.is_element(*k) {
                self.normalize(*k);
            }
        }
        let kids = self.children(el).to_vec();
        let mut merged: Vec<NodeId> = Vec::new();
        for k in kids {
            if self.is_text(k) {
                if self.text(k).is_empty() {
                    self.nodes[k.0].parent = None;
                    continue;
                }
                if let Some(&prev) = merged.last() {
                    if self.is_text(prev) {
                        let tail = self.text(k).to_string();
                        if let NodeData::Text { content } = &mut self.nodes[prev.0].data {
                            content.push_str(&tail);
                        }
                        self.nodes[k.0].parent = None;
                        continue;
                    }
                }
            }
            merged.push(k);
        }
        if let NodeData::Element { children, .. } = &mut self.nodes[el.0].data {
            *children = merged;
        }
    }

    // -------------------------------------------------------------------------
    // Traversal
    // -------------------------------------------------------------------------

    /// All elements under the root matching `selector`, in document order.
    pub fn select(&self, selector: &Selector) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.walk(self.root, &mut |doc, id| {
            if doc.is_element(id) && id != doc.root && selector.matches(doc, id) {
                found.push(id);
            }
        });
        found
    }

    pub fn matches(&self, id: NodeId, selector: &Selector) -> bool {
        self.is_element(id) && selector.matches(self, id)
    }

    /// Document-order text nodes under `el`, keeping only those the predicate
    /// accepts. The predicate runs during traversal, before any mutation.
    pub fn text_nodes_under<F>(&self, el: NodeId, accept: F) -> Vec<NodeId>
    where
        F: Fn(&Document, NodeId) -> bool,
    {
        let mut leaves = Vec::new();
        self.walk(el, &mut |doc, id| {
            if doc.is_text(id) && accept(doc, id) {
                leaves.push(id);
            }
        });
        leaves
    }

    fn walk<F>(&self, from: NodeId, visit: &mut F)
    where
        F: FnMut(&Document, NodeId),
    {
        visit(self, from);
        for &child in self.children(from) {
            self.walk(child, visit);
        }
    }

    /// Concatenated text content of all descendant text nodes, document order.
    pub fn text_of(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.walk(id, &mut |doc, n| {
            if doc.is_text(n) {
                out.push_str(doc.text(n));
            }
        });
        out
    }

    /// Number of characters of visible text under `id`.
    pub fn char_count(&self, id: NodeId) -> usize {
        self.text_of(id).chars().count()
    }

    // -------------------------------------------------------------------------
    // Shared style sheet
    // -------------------------------------------------------------------------

    /// The document's style registry, created lazily on first use and never
    /// torn down (process-lifetime resource, spec-wise).
    pub fn styles_mut(&mut self) -> &mut StyleRegistry {
        self.styles.get_or_insert_with(StyleRegistry::default)
    }

    pub fn styles(&self) -> Option<&StyleRegistry> {
        self.styles.as_ref()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId) {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        doc.set_attr(div, "class", "highlightable wide");
        let t1 = doc.create_text("Hello ");
        let b = doc.create_element("b");
        let t2 = doc.create_text("World");
        doc.append_child(b, t2);
        let root = doc.root();
        doc.append_child(root, div);
        doc.append_child(div, t1);
        doc.append_child(div, b);
        (doc, div)
    }

    #[test]
    fn test_text_of_concatenates_in_document_order() {
        let (doc, div) = sample();
        assert_eq!(doc.text_of(div), "Hello World");
        assert_eq!(doc.char_count(div), 11);
    }

    #[test]
    fn test_has_class_token_match() {
        let (doc, div) = sample();
        assert!(doc.has_class(div, "highlightable"));
        assert!(doc.has_class(div, "wide"));
        assert!(!doc.has_class(div, "high"));
    }

    #[test]
    fn test_replace_with_splices_at_position() {
        let (mut doc, div) = sample();
        let leaves = doc.text_nodes_under(div, |_, _| true);
        let first = leaves[0];
        let a = doc.create_text("Hi ");
        let b = doc.create_text("there ");
        assert!(doc.replace_with(first, vec![a, b]));
        assert_eq!(doc.text_of(div), "Hi there World");
        assert_eq!(doc.parent(first), None);
    }

    #[test]
    fn test_replace_detached_node_is_noop() {
        let (mut doc, div) = sample();
        let orphan = doc.create_text("nope");
        let other = doc.create_text("x");
        assert!(!doc.replace_with(orphan, vec![other]));
        assert_eq!(doc.text_of(div), "Hello World");
    }

    #[test]
    fn test_unwrap_moves_children_up() {
        let (mut doc, div) = sample();
        let b = doc.children(div)[1];
        assert_eq!(doc.tag(b), "b");
        assert!(doc.unwrap(b));
        assert_eq!(doc.text_of(div), "Hello World");
        // b is gone from the tree, its text child is now a direct child
        assert_eq!(doc.children(div).len(), 2);
        assert!(doc.is_text(doc.children(div)[1]));
    }

    #[test]
    fn test_normalize_merges_adjacent_text_and_drops_empties() {
        let (mut doc, div) = sample();
        let b = doc.children(div)[1];
        doc.unwrap(b);
        let empty = doc.create_text("");
        doc.append_child(div, empty);
        doc.normalize(div);
        assert_eq!(doc.children(div).len(), 1);
        assert_eq!(doc.text(doc.children(div)[0]), "Hello World");
    }

    #[test]
    fn test_insert_after_preserves_order() {
        let (mut doc, div) = sample();
        let first = doc.children(div)[0];
        let mid = doc.create_text("brave ");
        doc.insert_after(first, vec![mid]);
        assert_eq!(doc.text_of(div), "Hello brave World");
    }

    #[test]
    fn test_text_nodes_under_predicate_rejects() {
        let (doc, div) = sample();
        let all = doc.text_nodes_under(div, |_, _| true);
        assert_eq!(all.len(), 2);
        let non_ws = doc.text_nodes_under(div, |d, n| !d.text(n).trim().is_empty());
        assert_eq!(non_ws.len(), 2);
        let none = doc.text_nodes_under(div, |_, _| false);
        assert!(none.is_empty());
    }
}
