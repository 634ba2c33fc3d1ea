//! Node descriptions
//!
//! A tree of [`Node`]s is the input to every render: tag, properties,
//! children, an optional `if`, and optional binding and pipe metadata.

mod node;

pub use node::{BindingFn, Content, Node, Prop, PropValue, Shorthand};
pub(crate) use node::{NODE_KEYS, value_to_text};
