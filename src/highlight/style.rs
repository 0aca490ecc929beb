//! Shared style sheet: one custom-style rule per requesting instance.
//!
//! The registry is an explicit resource handle owned by the `Document`
//! (created lazily on first custom-style use, never torn down) rather than
//! hidden process-wide state. Rules are keyed by marker class plus
//! owning-instance id, so two instances never collide even when they share
//! a marker class. Appends are never revisited.

use serde::{Deserialize, Serialize};

/// One appended rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleRule {
    pub marker_class: String,
    pub instance_id: u64,
    pub css: String,
}

/// Append-only rule store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleRegistry {
    rules: Vec<StyleRule>,
}

impl StyleRegistry {
    /// Append the rule for `(marker_class, instance_id)` unless it already
    /// exists. The selector scopes by both class and instance attribute.
    pub fn ensure_rule(
        &mut self,
        marker_tag: &str,
        marker_class: &str,
        instance_attr: &str,
        instance_id: u64,
        declarations: &str,
    ) {
        let exists = self
            .rules
            .iter()
            .any(|r| r.marker_class == marker_class && r.instance_id == instance_id);
        if exists {
            return;
        }
        let css = format!(
            r#"{marker_tag}.{marker_class}[{instance_attr}="{instance_id}"] {{ {declarations} }}"#
        );
        self.rules.push(StyleRule {
            marker_class: marker_class.to_string(),
            instance_id,
            css,
        });
    }

    pub fn rules(&self) -> &[StyleRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The whole sheet as one CSS string, for the host to install.
    pub fn to_css(&self) -> String {
        self.rules
            .iter()
            .map(|r| r.css.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_selector_scopes_class_and_instance() {
        let mut reg = StyleRegistry::default();
        reg.ensure_rule(
            "span",
            "highlight-text",
            "data-highlighter-instance",
            3,
            "background: yellow;",
        );
        assert_eq!(reg.len(), 1);
        assert_eq!(
            reg.rules()[0].css,
            r#"span.highlight-text[data-highlighter-instance="3"] { background: yellow; }"#
        );
    }

    #[test]
    fn test_repeated_ensure_appends_once() {
        let mut reg = StyleRegistry::default();
        for _ in 0..3 {
            reg.ensure_rule("span", "hl", "data-i", 1, "color: red;");
        }
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_same_class_different_instances_never_collide() {
        let mut reg = StyleRegistry::default();
        reg.ensure_rule("span", "hl", "data-i", 1, "color: red;");
        reg.ensure_rule("span", "hl", "data-i", 2, "color: blue;");
        assert_eq!(reg.len(), 2);
        let css = reg.to_css();
        assert!(css.contains(r#"[data-i="1"]"#));
        assert!(css.contains(r#"[data-i="2"]"#));
    }
}
