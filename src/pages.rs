//! Declarative views with path-bound data
//!
//! This module provides access to bindery-pages: the data store, the binding
//! resolver, the string and element renderers, and the hydration runtime.
//!
//! ## Architecture
//!
//! - **Data Store**: one JSON root addressed by dotted paths, notifying on change
//! - **Binding Resolver**: picks the most specific registrations for a mutated path
//! - **Render Engine**: one evaluation pass shared by SSR and the client
//! - **Hydration**: markers and a state script let the client resume server output
//!
//! ## Example
//!
//! ```
//! use bindery::pages::{Client, PropValue, Target, p};
//! use serde_json::json;
//!
//! let client = Client::new();
//! let counter = p(()).bind("count").bound("text", |count, _, _| {
//!     count.cloned().map_or(PropValue::Absent, PropValue::Json)
//! });
//! client.render(&counter, Some(json!({"count": 1})), Target::Attach(client.body()));
//!
//! client.store().set("count", json!(2)).unwrap();
//!
//! assert_eq!(
//!     client.inner_html(client.body()),
//!     "<p data-bd-id=\"b0\" data-bd-bind=\"count\">2</p>"
//! );
//! ```

// Re-export all bindery-pages functionality
pub use bindery_pages::*;
