//! The highlight pipeline.
//!
//! Control flow per `Highlighter::highlight` call:
//! resolve containers -> (per container) flatten text leaves -> locate
//! match spans -> rewrite ranges into markers. Removal selects markers by
//! class plus owning-instance attribute and structurally inverts the wrap.

pub mod engine;
pub mod flatten;
pub mod locate;
pub mod pattern;
pub mod rewrite;
pub mod style;

pub use engine::*;
pub use flatten::*;
pub use locate::*;
pub use pattern::*;
pub use rewrite::*;
pub use style::*;
