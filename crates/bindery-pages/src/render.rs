//! Rendering of node trees
//!
//! One evaluation pass drives one of two output builders
//! ([`MarkupBuilder`] for strings, [`DomBuilder`] for the in-memory
//! document), so server and client output follow the same rules.

pub(crate) mod engine;
pub mod target;

pub(crate) use engine::Engine;
pub use target::{Builder, DomBuilder, MarkupBuilder, OpenElement};
