//! Selector subset for container discovery.
//!
//! Supports what the highlighter's addressing schemes need and nothing more:
//! tag names, `.class`, `#id`, `[attr]` presence tests, compounds of those
//! (`div.note[data-x]`), and comma-separated lists. No combinators.

use super::{Document, DomError, NodeId};

/// A parsed selector list. Matches if any compound matches.
#[derive(Debug, Clone)]
pub struct Selector {
    compounds: Vec<Compound>,
}

#[derive(Debug, Clone, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<String>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Selector, DomError> {
        let mut compounds = Vec::new();
        for part in input.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(DomError::Selector(format!(
                    "empty component in {input:?}"
                )));
            }
            compounds.push(Compound::parse(part)?);
        }
        Ok(Selector { compounds })
    }

    /// Convenience: selector matching a single class token.
    pub fn for_class(class: &str) -> Result<Selector, DomError> {
        Selector::parse(&format!(".{class}"))
    }

    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        self.compounds.iter().any(|c| c.matches(doc, id))
    }
}

impl Compound {
    fn parse(part: &str) -> Result<Compound, DomError> {
        let mut out = Compound::default();
        let mut rest = part;

        fn take_ident(s: &str) -> (&str, &str) {
            let end = s
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
                .unwrap_or(s.len());
            (&s[..end], &s[end..])
        }

        // optional leading tag name
        if rest
            .chars()
            .next()
            .map(|c| c.is_ascii_alphanumeric())
            .unwrap_or(false)
        {
            let (ident, r) = take_ident(rest);
            out.tag = Some(ident.to_string());
            rest = r;
        }

        while !rest.is_empty() {
            let head = rest.chars().next().expect("non-empty rest");
            match head {
                '.' => {
                    let (ident, r) = take_ident(&rest[1..]);
                    if ident.is_empty() {
                        return Err(DomError::Selector(format!("bare '.' in {part:?}")));
                    }
                    out.classes.push(ident.to_string());
                    rest = r;
                }
                '#' => {
                    let (ident, r) = take_ident(&rest[1..]);
                    if ident.is_empty() {
                        return Err(DomError::Selector(format!("bare '#' in {part:?}")));
                    }
                    out.id = Some(ident.to_string());
                    rest = r;
                }
                '[' => {
                    let Some(close) = rest.find(']') else {
                        return Err(DomError::Selector(format!("unclosed '[' in {part:?}")));
                    };
                    let name = rest[1..close].trim();
                    if name.is_empty() {
                        return Err(DomError::Selector(format!("empty '[]' in {part:?}")));
                    }
                    out.attrs.push(name.to_string());
                    rest = &rest[close + 1..];
                }
                other => {
                    return Err(DomError::Selector(format!(
                        "unexpected {other:?} in {part:?}"
                    )));
                }
            }
        }
        Ok(out)
    }

    fn matches(&self, doc: &Document, id: NodeId) -> bool {
        if let Some(tag) = &self.tag {
            if doc.tag(id) != tag {
                return false;
            }
        }
        if let Some(want) = &self.id {
            if doc.attr(id, "id") != Some(want.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| doc.has_class(id, c)) {
            return false;
        }
        self.attrs.iter().all(|a| doc.attr(id, a).is_some())
    }
}

// =============================================================================
// Tests
// =============================================================================
