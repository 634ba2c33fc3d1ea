//! Hydration Runtime
//!
//! Errors and context for taking over a server-rendered page on the client.
//! The hydration itself is performed by [`Client::hydrate`](crate::client::Client::hydrate).

use crate::error::Error;
use crate::ssr::{BindingRecord, SsrState};

/// Errors that can occur during hydration.
#[derive(Debug)]
pub enum HydrationError {
	/// The hydration root element was not found.
	RootNotFound(String),
	/// SSR state could not be parsed.
	StateParseError(String),
	/// The rebuilt DOM does not match the server markup.
	StructureMismatch {
		/// The root or marker id where the mismatch was found.
		id: String,
		/// Server markup.
		expected: String,
		/// Client markup.
		actual: String,
	},
	/// A store or binding error raised while hydrating.
	Binding(Error),
}

impl std::fmt::Display for HydrationError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::RootNotFound(id) => write!(f, "Hydration root element not found: {}", id),
			Self::StateParseError(msg) => write!(f, "Failed to parse SSR state: {}", msg),
			Self::StructureMismatch {
				id,
				expected,
				actual,
			} => {
				write!(
					f,
					"DOM structure mismatch at {}: expected {}, found {}",
					id, expected, actual
				)
			}
			Self::Binding(err) => write!(f, "Hydration failed: {}", err),
		}
	}
}

impl std::error::Error for HydrationError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Binding(err) => Some(err),
			_ => None,
		}
	}
}

impl From<Error> for HydrationError {
	fn from(err: Error) -> Self {
		Self::Binding(err)
	}
}

/// Context for hydration operations.
#[derive(Debug, Default)]
pub struct HydrationContext {
	/// The restored SSR state.
	state: SsrState,
	/// Server markup of the root's content, when known.
	markup: Option<String>,
	/// Whether hydration has been completed.
	hydrated: bool,
}

impl HydrationContext {
	/// Creates a new hydration context.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a context from SSR state.
	pub fn from_state(state: SsrState) -> Self {
		Self {
			state,
			markup: None,
			hydrated: false,
		}
	}

	/// Restores state and root markup from a rendered page.
	///
	/// `root_id` is the `id` of the content root (`app` by default).
	pub fn from_page_html(page: &str, root_id: &str) -> Result<Self, HydrationError> {
		let state = SsrState::extract(page)
			.map_err(|e| HydrationError::StateParseError(e.to_string()))?
			.unwrap_or_default();
		let markup = root_markup(page, root_id)
			.ok_or_else(|| HydrationError::RootNotFound(root_id.to_string()))?;
		Ok(Self {
			state,
			markup: Some(markup.to_string()),
			hydrated: false,
		})
	}

	/// Sets the server markup to compare against.
	pub fn with_markup(mut self, markup: impl Into<String>) -> Self {
		self.markup = Some(markup.into());
		self
	}

	/// Returns the SSR state.
	pub fn state(&self) -> &SsrState {
		&self.state
	}

	/// Returns the server markup, if known.
	pub fn markup(&self) -> Option<&str> {
		self.markup.as_deref()
	}

	/// Looks up a server binding record by marker id.
	pub fn binding(&self, id: &str) -> Option<&BindingRecord> {
		self.state.binding(id)
	}

	/// Checks if hydration is complete.
	pub fn is_hydrated(&self) -> bool {
		self.hydrated
	}

	/// Marks hydration as complete.
	pub fn mark_hydrated(&mut self) {
		self.hydrated = true;
	}
}

/// The content of `<div id="{root_id}">` in a page rendered by
/// [`SsrRenderer::render_page`](crate::ssr::SsrRenderer::render_page).
fn root_markup<'p>(page: &'p str, root_id: &str) -> Option<&'p str> {
	let opening = format!("<div id=\"{}\">", root_id);
	let start = page.find(&opening)? + opening.len();
	let rest = &page[start..];
	let limit = [
		rest.find(&format!("<script id=\"{}\"", crate::ssr::STATE_SCRIPT_ID)),
		rest.find("</body>"),
	]
	.into_iter()
	.flatten()
	.min()
	.unwrap_or(rest.len());
	let end = rest[..limit].rfind("</div>")?;
	Some(&rest[..end])
}
