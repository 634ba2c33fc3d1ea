//! Bindery Pages - declarative HTML with path-bound data
//!
//! Views are plain Rust values: a [`Node`] names a tag, carries a shorthand
//! and properties, and may bind itself to a dotted [`Path`] in a shared data
//! [`Store`]. The same node tree renders to an HTML string on the server and
//! to a live element tree on the client. When the store changes at a path,
//! only the most specific bindings for that path re-render.
//!
//! ## Features
//!
//! - **Path-addressed store**: `get` / `set` / `push` / `remove` on one JSON root
//! - **Selective re-render**: the deepest matching ancestor binding and every bound descendant
//! - **Shared evaluation**: one pass drives both the string and the element builder
//! - **Hydration**: SSR markers and a state script let the client take over server output
//! - **Pipes**: named values and functions passed to binding functions, re-importable by module path
//!
//! ## Architecture
//!
//! - [`path`]: dotted paths and their ancestry relations
//! - [`store`]: the data store and its change subscriber
//! - [`component`]: node descriptions, properties and content
//! - [`builder`]: the element catalog and per-tag constructors
//! - [`pipe`]: pipe declarations and the context handed to binding functions
//! - [`binding`]: registrations and the specificity rule
//! - [`dom`]: the in-memory element tree used on the client
//! - [`render`]: the evaluation pass and its output builders
//! - [`ssr`]: server-side rendering, markers and the state script
//! - [`hydration`]: module import hook and hydration context
//! - [`client`]: the client runtime
//! - [`template`]: template modules, layouts and the template registry
//! - [`config`]: TOML configuration for both halves
//!
//! ## Example
//!
//! ```
//! use bindery_pages::{Client, PropValue, Target, render_to_string, ul};
//! use serde_json::{Value, json};
//!
//! let list = ul(()).bind("todo").bound("children", |todo, el, _| {
//!     let items = todo.and_then(|t| t.get("items")).and_then(Value::as_array);
//!     PropValue::children(items.into_iter().flatten().map(|item| el.li(item)))
//! });
//!
//! let html = render_to_string(&list, json!({"todo": {"items": ["milk"]}}));
//! assert_eq!(
//!     html,
//!     "<ul data-bd-id=\"b0\" data-bd-bind=\"todo\"><li>milk</li></ul>"
//! );
//!
//! let client = Client::new();
//! client.render(&list, Some(json!({"todo": {"items": ["milk"]}})), Target::Attach(client.body()));
//! client.store().push("todo.items", json!("eggs")).unwrap();
//! assert!(client.inner_html(client.body()).contains("<li>eggs</li>"));
//! ```

#![warn(missing_docs)]

// Data
pub mod path;
pub mod store;

// Node descriptions
pub mod builder;
pub mod component;
pub mod html;
pub mod pipe;

// Binding and rendering
pub mod binding;
pub mod dom;
pub mod render;

// Server-side rendering
pub mod ssr;
pub mod template;

// Client-side runtime
pub mod client;
pub mod hydration;

pub mod config;
pub mod error;

pub use binding::{RegKey, Registration, Registry, select_affected};
pub use builder::html::{
	a, button, div, element, h1, h2, h3, img, input, label, li, ol, option, p, pre, section,
	select, span, svg, textarea, ul,
};
pub use builder::{ElementSpec, Elements, Namespace};
pub use client::{Client, ClientOptions, Target, current, current_or_init, install, render};
pub use component::{BindingFn, Content, Node, Prop, PropValue, Shorthand};
pub use config::BinderyConfig;
pub use dom::{Document, NodeId};
pub use error::{Error, Result};
pub use hydration::{HydrationContext, HydrationError, ModuleCache, ModuleResolver, NoModules};
pub use path::Path;
pub use pipe::{Pipe, PipeContext, PipeEntry, PipeValue};
pub use render::{Builder, DomBuilder, MarkupBuilder};
pub use ssr::{SsrOptions, SsrRenderer, SsrState, render_to_string};
pub use store::{Store, Subscriber};
pub use template::{TemplateModule, TemplateRegistry};
