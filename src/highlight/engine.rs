//! Highlighter: configuration bundle, instance identity, highlight/remove.
//!
//! An instance is created once per call site and lives as long as the caller
//! holds it. Both mutating operations are synchronous and run to completion;
//! there is no background work and no cancellation. Repeated `highlight`
//! calls are additive — prior markers from the same instance stay until the
//! caller removes them.
//!
//! All user-facing misuse degrades to a no-op: an empty term list builds no
//! pattern, an unresolvable span is skipped, a marker whose parent vanished
//! is skipped during removal. Nothing here returns an error.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::dom::{Document, NodeId, Selector};

use super::flatten::FlatIndex;
use super::locate::{locate_matches, passes_marked_guard};
use super::pattern::{build_pattern, Pattern};
use super::rewrite::{apply_spans_deep, rewrite_leaf_shallow, MarkerSpec};

// =============================================================================
// Configuration
// =============================================================================

fn default_marker_class() -> String {
    "highlight-text".to_string()
}

fn default_marker_tag() -> String {
    "span".to_string()
}

fn default_container_class() -> String {
    "highlightable".to_string()
}

fn default_exclude_selector() -> String {
    "script,style,textarea,input,[contenteditable]".to_string()
}

fn default_instance_attr() -> String {
    "data-highlighter-instance".to_string()
}

/// Configuration for a `Highlighter` instance. Every field is optional in
/// serialized form and falls back to the documented default.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HighlighterConfig {
    /// Class stamped onto every marker element.
    #[serde(default = "default_marker_class")]
    pub marker_class: String,
    /// Matching is case-insensitive unless set. Ignored for pre-built
    /// regex patterns.
    #[serde(default)]
    pub case_sensitive: bool,
    /// Tag name of marker elements.
    #[serde(default = "default_marker_tag")]
    pub marker_tag: String,
    /// Containers are elements with this class, unless `container_selector`
    /// is given.
    #[serde(default = "default_container_class")]
    pub container_class: String,
    /// Elements matching this never become containers: mutating the text of
    /// script/style hosts, free-text inputs or editable regions would corrupt
    /// executable content or editor state.
    #[serde(default = "default_exclude_selector")]
    pub exclude_selector: String,
    /// Explicit container selection. When present it is used exactly and
    /// completely overrides the class + exclusion pair.
    #[serde(default)]
    pub container_selector: Option<String>,
    /// CSS declarations for this instance's markers; appended once to the
    /// document's shared style registry.
    #[serde(default)]
    pub custom_styles: Option<String>,
    /// Deep search: match over the flattened concatenation of a container's
    /// leaves so matches may cross leaf boundaries. Shallow (the default)
    /// matches each leaf independently.
    #[serde(default)]
    pub deep_search: bool,
    /// Attribute carrying the owning-instance identifier on every marker.
    #[serde(default = "default_instance_attr")]
    pub instance_attr: String,
}

impl Default for HighlighterConfig {
    fn default() -> Self {
        Self {
            marker_class: default_marker_class(),
            case_sensitive: false,
            marker_tag: default_marker_tag(),
            container_class: default_container_class(),
            exclude_selector: default_exclude_selector(),
            container_selector: None,
            custom_styles: None,
            deep_search: false,
            instance_attr: default_instance_attr(),
        }
    }
}

// =============================================================================
// Summary
// =============================================================================

/// Counts for one highlight pass.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct HighlightSummary {
    pub containers: usize,
    /// Match spans actually applied to the tree.
    pub matches_wrapped: usize,
    /// Spans discarded by the deep-mode guard or unresolvable at rewrite time.
    pub matches_skipped: usize,
    /// Marker elements created (a cross-leaf match creates several).
    pub markers_created: usize,
}

// =============================================================================
// Highlighter
// =============================================================================

/// Monotonic process-wide instance counter; every instance gets a distinct
/// identifier at construction. Atomic so identifiers stay unique if the
/// crate is ever driven from more than one thread.
static INSTANCE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// A highlighter instance: one configuration bundle plus a unique
/// owning-instance identifier.
#[derive(Debug, Clone)]
pub struct Highlighter {
    config: HighlighterConfig,
    instance_id: u64,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new(HighlighterConfig::default())
    }
}

impl Highlighter {
    pub fn new(config: HighlighterConfig) -> Self {
        Self {
            config,
            instance_id: INSTANCE_COUNTER.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    pub fn config(&self) -> &HighlighterConfig {
        &self.config
    }

    fn marker_spec(&self) -> MarkerSpec {
        MarkerSpec {
            tag: self.config.marker_tag.clone(),
            class: self.config.marker_class.clone(),
            instance_attr: self.config.instance_attr.clone(),
            instance_id: self.instance_id,
        }
    }

    // -------------------------------------------------------------------------
    // highlight
    // -------------------------------------------------------------------------

    /// Wrap every pattern match under every container in a marker element
    /// tagged with this instance's identifier. Additive across calls.
    pub fn highlight<P: Into<Pattern>>(&self, doc: &mut Document, pattern: P) -> HighlightSummary {
        let mut summary = HighlightSummary::default();
        let Some(re) = build_pattern(pattern.into(), self.config.case_sensitive) else {
            return summary; // empty term list: no-op pass
        };

        if let Some(declarations) = &self.config.custom_styles {
            let declarations = declarations.clone();
            doc.styles_mut().ensure_rule(
                &self.config.marker_tag,
                &self.config.marker_class,
                &self.config.instance_attr,
                self.instance_id,
                &declarations,
            );
        }

        let containers = self.resolve_containers(doc);
        summary.containers = containers.len();
        log::debug!(
            "highlight: instance {} scanning {} container(s), deep={}",
            self.instance_id,
            containers.len(),
            self.config.deep_search
        );

        let marker = self.marker_spec();
        for container in containers {
            if self.config.deep_search {
                self.highlight_deep(doc, container, &re, &marker, &mut summary);
            } else {
                self.highlight_shallow(doc, container, &re, &marker, &mut summary);
            }
        }
        log::debug!(
            "highlight: instance {} wrapped {} match(es), skipped {}",
            self.instance_id,
            summary.matches_wrapped,
            summary.matches_skipped
        );
        summary
    }

    fn highlight_deep(
        &self,
        doc: &mut Document,
        container: NodeId,
        re: &regex::Regex,
        marker: &MarkerSpec,
        summary: &mut HighlightSummary,
    ) {
        let index = FlatIndex::build(doc, container, &self.config.marker_class);
        if index.is_empty() {
            return;
        }
        let spans = locate_matches(re, index.text());
        let (kept, guarded): (Vec<_>, Vec<_>) = spans
            .into_iter()
            .partition(|s| passes_marked_guard(&index, s));
        summary.matches_skipped += guarded.len();
        let before = count_markers(doc, container, marker);
        let (applied, unresolved) = apply_spans_deep(doc, &index, &kept, marker);
        summary.matches_wrapped += applied;
        summary.matches_skipped += unresolved;
        summary.markers_created += count_markers(doc, container, marker) - before;
    }

    fn highlight_shallow(
        &self,
        doc: &mut Document,
        container: NodeId,
        re: &regex::Regex,
        marker: &MarkerSpec,
        summary: &mut HighlightSummary,
    ) {
        let leaves = doc.text_nodes_under(container, |d, n| !d.text(n).trim().is_empty());
        for leaf in leaves {
            let wrapped = rewrite_leaf_shallow(doc, leaf, re, marker);
            summary.matches_wrapped += wrapped;
            summary.markers_created += wrapped;
        }
    }

    /// Explicit selector, when present, is used exactly; otherwise containers
    /// are elements of the container class that do not match the exclusion.
    fn resolve_containers(&self, doc: &Document) -> Vec<NodeId> {
        if let Some(raw) = &self.config.container_selector {
            return Selector::parse(raw)
                .map(|sel| doc.select(&sel))
                .unwrap_or_default();
        }
        let Ok(by_class) = Selector::for_class(&self.config.container_class) else {
            return Vec::new();
        };
        let excluded = Selector::parse(&self.config.exclude_selector).ok();
        doc.select(&by_class)
            .into_iter()
            .filter(|&el| excluded.as_ref().map_or(true, |ex| !doc.matches(el, ex)))
            .collect()
    }

    // -------------------------------------------------------------------------
    // removeHighlights
    // -------------------------------------------------------------------------

    /// Remove every marker owned by this instance: move its children out to
    /// its former position, drop the empty marker, and merge adjacent text
    /// nodes so a plain-text scan reads as if this instance never ran.
    /// Markers owned by other instances are untouched even when they share
    /// the marker class. Returns the number of markers removed.
    pub fn remove_highlights(&self, doc: &mut Document) -> usize {
        let Ok(by_class) = Selector::for_class(&self.config.marker_class) else {
            return 0;
        };
        let id_value = self.instance_id.to_string();
        let markers: Vec<NodeId> = doc
            .select(&by_class)
            .into_iter()
            .filter(|&el| doc.attr(el, &self.config.instance_attr) == Some(id_value.as_str()))
            .collect();

        let mut removed = 0usize;
        for marker in markers {
            let Some(parent) = doc.parent(marker) else {
                continue; // already orphaned; skip, others proceed
            };
            if doc.unwrap(marker) {
                doc.normalize(parent);
                removed += 1;
            }
        }
        log::debug!(
            "removeHighlights: instance {} removed {} marker(s)",
            self.instance_id,
            removed
        );
        removed
    }
}

fn count_markers(doc: &Document, container: NodeId, marker: &MarkerSpec) -> usize {
    let Ok(sel) = Selector::for_class(&marker.class) else {
        return 0;
    };
    let id_value = marker.instance_id.to_string();
    doc.select(&sel)
        .into_iter()
        .filter(|&el| {
            doc.attr(el, &marker.instance_attr) == Some(id_value.as_str())
                && is_descendant(doc, el, container)
        })
        .count()
}

fn is_descendant(doc: &Document, mut node: NodeId, ancestor: NodeId) -> bool {
    while let Some(parent) = doc.parent(node) {
        if parent == ancestor {
            return true;
        }
        node = parent;
    }
    false
}

// =============================================================================
// Tests
// =============================================================================
