//! Element construction
//!
//! - [`html`]: the element catalog, shorthand normalizers and one constructor
//!   per tag (`div`, `ul`, `li`, `svg`, ...).

pub mod html;

pub use html::{Elements, ElementSpec, Namespace, element};
