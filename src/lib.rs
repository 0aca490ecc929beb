//! Markcore: Deep-Search Text Highlighter
//!
//! A Rust/WASM implementation of in-document search-term highlighting:
//! find every occurrence of a set of terms in the visible text of a
//! document tree, wrap each match in a styled marker element, and undo
//! the whole thing later without losing a single character of content.
//!
//! # Architecture
//!
//! ## Highlight pipeline
//! - `pattern.rs` - PatternBuilder: term list -> one escaped alternation regex
//! - `flatten.rs` - FlatIndex: document-order leaf walk + offset coordinate system
//! - `locate.rs` - Match location over flat or per-leaf text, guard policies
//! - `rewrite.rs` - Range rewriting: split leaves, wrap matched slices in markers
//! - `engine.rs` - Highlighter: configuration, instance identity, highlight/remove
//! - `style.rs` - StyleRegistry: per-instance custom style rules
//!
//! ## Host document model
//! - `dom/` - Arena-backed markup tree the highlighter mutates: parse,
//!   serialize, select, traverse, split, replace, unwrap, normalize
//!
//! # Usage (WASM)
//! ```javascript,ignore
//! import init, { HighlightDocument, TextHighlighter } from 'markcore';
//!
//! await init();
//!
//! const doc = HighlightDocument.fromHtml(
//!   '<div class="highlightable">Hello World! hello</div>'
//! );
//!
//! const highlighter = new TextHighlighter(null); // defaults
//! const summary = highlighter.highlight(doc, 'hello');
//! console.log(summary.matches_wrapped); // 2 (case-insensitive by default)
//!
//! highlighter.removeHighlights(doc);
//! console.log(doc.toHtml()); // original markup restored
//! ```

pub mod dom;
pub mod highlight;
pub mod wasm;

// Public exports - host document model
pub use dom::{Document, DomError, NodeId, Selector};

// Public exports - highlight pipeline
pub use highlight::*;

use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    format!("markcore v{}", env!("CARGO_PKG_VERSION"))
}
