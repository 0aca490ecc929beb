//! Markup parsing and serialization for `Document`.
//!
//! Reading is event-driven via quick-xml (`Start`/`Empty`/`Text`/`End`);
//! writing is a hand-walked serializer that escapes text with
//! `partial_escape` and attribute values with `escape`. Serialization is
//! deterministic: parse + serialize of an untouched document is stable,
//! which is what the no-op highlight guarantees are measured against.
//!
//! Comments, processing instructions and doctypes are dropped on read; the
//! highlighter has no use for them and they carry no visible text.

use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{Document, DomError, NodeId};

impl Document {
    /// Parse a complete markup document. Top-level nodes become children of
    /// the synthetic root.
    pub fn parse(markup: &str) -> Result<Document, DomError> {
        let mut doc = Document::new();
        let root = doc.root();
        doc.read_into(root, markup)?;
        Ok(doc)
    }

    /// Parse a markup fragment into detached nodes (used by the shallow-mode
    /// rewrite, which builds marker markup as a string and splices the parsed
    /// nodes over the original leaf).
    pub fn parse_fragment(&mut self, markup: &str) -> Result<Vec<NodeId>, DomError> {
        let holder = self.create_element("#fragment");
        self.read_into(holder, markup)?;
        let kids = self.children(holder).to_vec();
        for &k in &kids {
            self.nodes[k.0].parent = None;
        }
        if let super::NodeData::Element { children, .. } = &mut self.nodes[holder.0].data {
            children.clear();
        }
        Ok(kids)
    }

    fn read_into(&mut self, parent: NodeId, markup: &str) -> Result<(), DomError> {
        let mut reader = Reader::from_str(markup);
        let mut stack = vec![parent];
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let el = self.element_from_start(&e)?;
                    self.append_child(*stack.last().expect("open element stack"), el);
                    stack.push(el);
                }
                Ok(Event::Empty(e)) => {
                    let el = self.element_from_start(&e)?;
                    self.append_child(*stack.last().expect("open element stack"), el);
                }
                Ok(Event::End(_)) => {
                    stack.pop();
                }
                Ok(Event::Text(t)) => {
                    let content = t
                        .unescape()
                        .map_err(|e| DomError::Parse(e.to_string()))?
                        .into_owned();
                    if !content.is_empty() {
                        let text = self.create_text(&content);
                        self.append_child(*stack.last().expect("open element stack"), text);
                    }
                }
                Ok(Event::CData(c)) => {
                    let bytes = c.into_inner();
                    let content = String::from_utf8_lossy(&bytes).into_owned();
                    if !content.is_empty() {
                        let text = self.create_text(&content);
                        self.append_child(*stack.last().expect("open element stack"), text);
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {} // comments, PIs, doctypes
                Err(e) => return Err(DomError::Parse(e.to_string())),
            }
        }
        Ok(())
    }

    fn element_from_start(&mut self, e: &BytesStart) -> Result<NodeId, DomError> {
        let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let el = self.create_element(&tag);
        for attr in e.attributes() {
            let attr = attr.map_err(|err| DomError::Parse(err.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|err| DomError::Parse(err.to_string()))?
                .into_owned();
            self.set_attr(el, &key, &value);
        }
        Ok(el)
    }

    // -------------------------------------------------------------------------
    // Serialization
    // -------------------------------------------------------------------------

    /// Serialize the whole document (the synthetic root is not emitted).
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for &child in self.children(self.root()) {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Serialize the markup of an element's children.
    pub fn inner_html(&self, el: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(el) {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Serialize one node (element with subtree, or text).
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        if self.is_text(id) {
            out.push_str(&partial_escape(self.text(id)));
            return;
        }
        out.push('<');
        out.push_str(self.tag(id));
        for (k, v) in self.attrs(id) {
            out.push(' ');
            out.push_str(k);
            out.push_str("=\"");
            out.push_str(&escape(v.as_str()));
            out.push('"');
        }
        let children = self.children(id);
        if children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for &child in children {
            self.write_node(child, out);
        }
        out.push_str("</");
        out.push_str(self.tag(id));
        out.push('>');
    }
}

// =============================================================================
// Tests
// =============================================================================
