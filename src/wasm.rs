//! WASM facade: JS-facing handles over the document model and the
//! highlighter, one cross-boundary call per operation.
//!
//! The host keeps the document as a `HighlightDocument` handle, runs any
//! number of `TextHighlighter` instances against it, and serializes back to
//! markup whenever it wants to render.

use wasm_bindgen::prelude::*;

use crate::dom::Document;
use crate::highlight::{Highlighter, HighlighterConfig, Pattern};

// =============================================================================
// HighlightDocument
// =============================================================================

/// The host's handle to a parsed document tree.
#[wasm_bindgen]
pub struct HighlightDocument {
    inner: Document,
}

#[wasm_bindgen]
impl HighlightDocument {
    /// Parse markup into a document handle.
    #[wasm_bindgen(js_name = fromHtml)]
    pub fn from_html(markup: &str) -> Result<HighlightDocument, JsValue> {
        Document::parse(markup)
            .map(|inner| HighlightDocument { inner })
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Serialize the current tree back to markup.
    #[wasm_bindgen(js_name = toHtml)]
    pub fn to_html(&self) -> String {
        self.inner.to_html()
    }

    /// Concatenated visible text of the whole document.
    #[wasm_bindgen(js_name = textContent)]
    pub fn text_content(&self) -> String {
        self.inner.text_of(self.inner.root())
    }

    /// Number of visible text characters.
    #[wasm_bindgen(js_name = charCount)]
    pub fn char_count(&self) -> usize {
        self.inner.char_count(self.inner.root())
    }

    /// All custom-style rules appended so far, as one CSS string the host
    /// can install in a shared style sheet.
    #[wasm_bindgen(js_name = styleRules)]
    pub fn style_rules(&self) -> String {
        self.inner
            .styles()
            .map(|s| s.to_css())
            .unwrap_or_default()
    }
}

// =============================================================================
// TextHighlighter
// =============================================================================

/// A highlighter instance bound to one configuration bundle.
#[wasm_bindgen]
pub struct TextHighlighter {
    inner: Highlighter,
}

#[wasm_bindgen]
impl TextHighlighter {
    /// Create a new highlighter with optional configuration.
    ///
    /// # Arguments
    /// * `config` - Optional JSON configuration object; `null`/`undefined`
    ///   uses the documented defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<TextHighlighter, JsValue> {
        let config: HighlighterConfig = if config.is_null() || config.is_undefined() {
            HighlighterConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?
        };
        Ok(Self {
            inner: Highlighter::new(config),
        })
    }

    /// This instance's owning identifier, as stamped on its markers.
    #[wasm_bindgen(js_name = instanceId)]
    pub fn instance_id(&self) -> u64 {
        self.inner.instance_id()
    }

    /// Highlight a term or an array of terms. Returns a summary object.
    #[wasm_bindgen]
    pub fn highlight(
        &self,
        doc: &mut HighlightDocument,
        terms: JsValue,
    ) -> Result<JsValue, JsValue> {
        let pattern = if let Some(term) = terms.as_string() {
            Pattern::Term(term)
        } else {
            serde_wasm_bindgen::from_value::<Vec<String>>(terms)
                .map(Pattern::Terms)
                .map_err(|e| JsValue::from_str(&format!("Invalid terms: {}", e)))?
        };
        let summary = self.inner.highlight(&mut doc.inner, pattern);
        serde_wasm_bindgen::to_value(&summary).map_err(|e| {
            web_sys::console::error_1(
                &format!("[TextHighlighter] Serialization failed: {:?}", e).into(),
            );
            JsValue::from_str("Serialization error")
        })
    }

    /// Highlight a single term (fast path).
    #[wasm_bindgen(js_name = highlightTerm)]
    pub fn highlight_term(&self, doc: &mut HighlightDocument, term: &str) -> usize {
        self.inner.highlight(&mut doc.inner, term).matches_wrapped
    }

    /// Remove every marker owned by this instance. Returns the number of
    /// markers removed.
    #[wasm_bindgen(js_name = removeHighlights)]
    pub fn remove_highlights(&self, doc: &mut HighlightDocument) -> usize {
        self.inner.remove_highlights(&mut doc.inner)
    }

    /// Get highlighter status
    #[wasm_bindgen(js_name = getStatus)]
    pub fn get_status(&self) -> JsValue {
        let config = self.inner.config();
        let status = serde_json::json!({
            "instance_id": self.inner.instance_id(),
            "deep_search": config.deep_search,
            "marker_class": config.marker_class,
            "marker_tag": config.marker_tag,
            "case_sensitive": config.case_sensitive,
            "has_custom_styles": config.custom_styles.is_some(),
        });
        JsValue::from_str(&status.to_string())
    }
}

// =============================================================================
// Tests (wasm only)
// =============================================================================
