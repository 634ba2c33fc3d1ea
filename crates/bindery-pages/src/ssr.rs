//! Server-side rendering
//!
//! - [`renderer`]: [`SsrRenderer`] and [`render_to_string`], one fresh store
//!   per render
//! - [`state`]: the store snapshot and binding records shipped to the client
//! - [`markers`]: `data-bd-*` attributes and marker id allocation

pub mod markers;
pub mod renderer;
pub mod state;

pub use markers::{ATTR_BIND, ATTR_ID, ATTR_PIPE, BindingMarker, IdAllocator};
pub use renderer::{SsrOptions, SsrRenderer, render_to_string};
pub use state::{BindingRecord, STATE_SCRIPT_ID, SsrState};
