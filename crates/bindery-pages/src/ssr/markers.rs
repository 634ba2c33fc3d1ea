//! Binding markers embedded in rendered markup.
//!
//! Every bound element carries its marker id, its bound path and, when its
//! pipe declares module descriptors, the module path of each such export.
//! Both the string and the DOM output emit the same markers, so a hydrated
//! client DOM serializes to the server's markup.

use crate::html::AttrValue;
use crate::path::Path;
use crate::pipe::Pipe;
use std::collections::BTreeMap;

/// The attribute name for marker ids.
pub const ATTR_ID: &str = "data-bd-id";

/// The attribute name for the bound path.
pub const ATTR_BIND: &str = "data-bd-bind";

/// The attribute name for pipe module paths (JSON `{name: modulePath}`).
pub const ATTR_PIPE: &str = "data-bd-pipe";

/// Hands out marker ids for one render pass.
///
/// Top-level bound elements get `b0`, `b1`, ... Bound elements nested inside
/// bound element `X` get `X.0`, `X.1`, ... with the counter restarting every
/// time `X` is rendered, so re-rendering `X` yields the same ids.
#[derive(Debug, Default)]
pub struct IdAllocator {
	next_root: usize,
	scopes: Vec<(String, usize)>,
}

impl IdAllocator {
	/// Starts at `b0`.
	pub fn new() -> Self {
		Self::default()
	}

	/// Starts at `b{next_root}`.
	pub fn starting_at(next_root: usize) -> Self {
		Self {
			next_root,
			scopes: Vec::new(),
		}
	}

	/// Allocates the next id in the current scope.
	pub fn next_id(&mut self) -> String {
		match self.scopes.last_mut() {
			Some((prefix, counter)) => {
				let id = format!("{}.{}", prefix, counter);
				*counter += 1;
				id
			}
			None => {
				let id = format!("b{}", self.next_root);
				self.next_root += 1;
				id
			}
		}
	}

	/// Opens the scope of bound element `id`.
	pub fn enter(&mut self, id: &str) {
		self.scopes.push((id.to_string(), 0));
	}

	/// Closes the innermost scope.
	pub fn leave(&mut self) {
		self.scopes.pop();
	}

	/// The next top-level counter value.
	pub fn next_root(&self) -> usize {
		self.next_root
	}
}

/// The markers carried by one bound element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingMarker {
	/// Marker id.
	pub id: String,
	/// Bound path.
	pub path: Path,
	/// Pipe export name -> module path.
	pub pipe: BTreeMap<String, String>,
}

impl BindingMarker {
	/// Builds the marker for a bound element.
	pub fn new(id: impl Into<String>, path: &Path, pipe: Option<&Pipe>) -> Self {
		Self {
			id: id.into(),
			path: path.clone(),
			pipe: pipe.map(Pipe::module_paths).unwrap_or_default(),
		}
	}

	/// The marker attributes, in output order.
	pub fn to_attrs(&self) -> Vec<(String, AttrValue)> {
		let mut attrs = vec![
			(ATTR_ID.to_string(), AttrValue::Text(self.id.clone())),
			(ATTR_BIND.to_string(), AttrValue::Text(self.path.to_string())),
		];

		if !self.pipe.is_empty()
			&& let Ok(json) = serde_json::to_string(&self.pipe)
		{
			attrs.push((ATTR_PIPE.to_string(), AttrValue::Text(json)));
		}

		attrs
	}
}
