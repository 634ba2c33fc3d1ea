//! # Bindery
//!
//! Declarative HTML construction with path-addressed data binding.
//!
//! A view is a tree of [`Node`](pages::Node) values. Each node may bind to a
//! dotted path in a shared data store; when that path changes, only the most
//! specific bindings re-render, in place. The same tree renders to a string
//! on the server and to live elements on the client, and the client can take
//! over server markup through hydration.
//!
//! ## Feature Flags
//!
//! - `pages` (default) - Store, binding resolver, renderers and hydration runtime
//!
//! ## Quick Example
//!
//! ```
//! use bindery::pages::{PropValue, render_to_string, span};
//! use serde_json::json;
//!
//! let greeting = span(()).bind("user.name").bound("text", |name, _, _| {
//!     PropValue::from(format!("Hello, {}", name.and_then(|n| n.as_str()).unwrap_or("stranger")))
//! });
//!
//! let html = render_to_string(&greeting, json!({"user": {"name": "Ada"}}));
//! assert_eq!(
//!     html,
//!     "<span data-bd-id=\"b0\" data-bd-bind=\"user.name\">Hello, Ada</span>"
//! );
//! ```

#[cfg(feature = "pages")]
pub mod pages;

// Re-export the types most applications touch
#[cfg(feature = "pages")]
pub use bindery_pages::{
	BinderyConfig, Client, ClientOptions, Error, Node, Path, Pipe, PropValue, Result, SsrOptions,
	SsrRenderer, Store, Target, TemplateModule, TemplateRegistry, render, render_to_string,
};
