//! SSR renderer for node trees.
//!
//! Every render builds a fresh request-scoped [`Store`] from the supplied
//! data, so no state is shared between requests.

use super::markers::IdAllocator;
use super::state::{BindingRecord, SsrState};
use crate::component::Node;
use crate::render::{Engine, MarkupBuilder};
use crate::store::Store;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Options for SSR rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsrOptions {
	/// Whether to include binding markers.
	pub include_hydration_markers: bool,
	/// Whether to minify the output.
	pub minify: bool,
	/// Whether to include SSR state script.
	pub include_state_script: bool,
	/// Language attribute for HTML element.
	pub lang: String,
	/// `id` of the element wrapping the page content.
	pub root_id: String,
}

impl Default for SsrOptions {
	fn default() -> Self {
		Self {
			include_hydration_markers: true,
			minify: false,
			include_state_script: true,
			lang: "en".to_string(),
			root_id: "app".to_string(),
		}
	}
}

impl SsrOptions {
	/// Creates new default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the language.
	pub fn lang(mut self, lang: impl Into<String>) -> Self {
		self.lang = lang.into();
		self
	}

	/// Disables binding markers.
	pub fn no_hydration(mut self) -> Self {
		self.include_hydration_markers = false;
		self
	}

	/// Disables the state script.
	pub fn no_state_script(mut self) -> Self {
		self.include_state_script = false;
		self
	}

	/// Enables minification.
	pub fn minify(mut self) -> Self {
		self.minify = true;
		self
	}

	/// Sets the `id` of the content root.
	pub fn root_id(mut self, root_id: impl Into<String>) -> Self {
		self.root_id = root_id.into();
		self
	}
}

/// The main SSR renderer.
#[derive(Debug, Default)]
pub struct SsrRenderer {
	options: SsrOptions,
	state: SsrState,
}

impl SsrRenderer {
	/// Creates a new renderer with default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a renderer with custom options.
	pub fn with_options(options: SsrOptions) -> Self {
		Self {
			options,
			state: SsrState::new(),
		}
	}

	/// Returns the options.
	pub fn options(&self) -> &SsrOptions {
		&self.options
	}

	/// Returns a reference to the SSR state.
	pub fn state(&self) -> &SsrState {
		&self.state
	}

	/// Returns a mutable reference to the SSR state.
	pub fn state_mut(&mut self) -> &mut SsrState {
		&mut self.state
	}

	/// Renders `node` against `data` to an HTML fragment.
	///
	/// The store snapshot and the bound elements are recorded in the state.
	pub fn render(&mut self, node: &Node, data: Value) -> String {
		let store = Store::with_data(data);
		let mut builder = MarkupBuilder::new();
		let mut engine = Engine::new(
			&mut builder,
			&store,
			IdAllocator::new(),
			self.options.include_hydration_markers,
		);
		engine.render(node);
		let (bindings, _) = engine.finish();

		debug!(tag = node.tag(), bindings = bindings.len(), "rendered node to string");
		self.state.set_data(store.snapshot());
		for binding in &bindings {
			self.state.add_binding(BindingRecord::from(binding));
		}
		builder.into_string()
	}

	/// Renders `node` against `data` to a full HTML page.
	pub fn render_page(&mut self, node: &Node, data: Value) -> String {
		let content = self.render(node, data);
		self.wrap_in_html(&content)
	}

	/// Wraps content in a full HTML document.
	pub fn wrap_in_html(&self, content: &str) -> String {
		let mut html = String::with_capacity(content.len() + 1024);

		// DOCTYPE and html opening
		html.push_str("<!DOCTYPE html>\n");
		html.push_str(&format!("<html lang=\"{}\">\n", html_escape(&self.options.lang)));

		// Head section
		html.push_str("<head>\n");
		html.push_str("<meta charset=\"UTF-8\">\n");
		html.push_str(
			"<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
		);
		html.push_str("</head>\n");

		// Body section
		html.push_str("<body>\n");
		html.push_str(&format!(
			"<div id=\"{}\">",
			html_escape(&self.options.root_id)
		));
		html.push_str(content);
		html.push_str("</div>\n");

		if self.options.include_state_script && !self.state.is_empty() {
			html.push_str(&self.state.to_script_tag());
			html.push('\n');
		}

		html.push_str("</body>\n");
		html.push_str("</html>");

		if self.options.minify {
			minify_html(&html)
		} else {
			html
		}
	}
}

/// Renders `node` against `data` with default options.
pub fn render_to_string(node: &Node, data: Value) -> String {
	SsrRenderer::new().render(node, data)
}

/// Simple HTML escape function.
fn html_escape(s: &str) -> String {
	s.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
		.replace('"', "&quot;")
		.replace('\'', "&#x27;")
}

/// Maximum input size for HTML minification (1 MiB).
///
/// Inputs exceeding this limit are returned unmodified.
const MINIFY_HTML_MAX_INPUT_SIZE: usize = 1024 * 1024;

/// Collapses runs of whitespace to one space.
///
/// Whitespace inside `<pre>` blocks is preserved.
pub(crate) fn minify_html(html: &str) -> String {
	if html.len() > MINIFY_HTML_MAX_INPUT_SIZE {
		return html.to_string();
	}

	let mut result = String::with_capacity(html.len());
	let mut prev_was_whitespace = false;
	let mut in_pre = false;
	let mut chars = html.char_indices().peekable();

	while let Some((byte_pos, c)) = chars.next() {
		let remaining = &html[byte_pos..];

		if !in_pre
			&& c == '<'
			&& remaining.strip_prefix("<pre").is_some_and(|after| {
				after.starts_with(|ch: char| ch == '>' || ch.is_ascii_whitespace())
					|| after.is_empty()
			}) {
			in_pre = true;
		}

		if in_pre && c == '<' && remaining.starts_with("</pre>") {
			result.push_str("</pre>");
			// '<' is already consumed
			for _ in 0..5 {
				chars.next();
			}
			in_pre = false;
			prev_was_whitespace = false;
			continue;
		}

		if in_pre {
			result.push(c);
		} else if c.is_whitespace() {
			if !prev_was_whitespace {
				result.push(' ');
				prev_was_whitespace = true;
			}
		} else {
			result.push(c);
			prev_was_whitespace = false;
		}
	}

	result
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::builder::html::{div, li, span, ul};
	use crate::component::PropValue;
	use rstest::rstest;
	use serde_json::json;

	fn bound_list() -> Node {
		ul(()).bind("items").bound("children", |items, el, _| {
			PropValue::children(
				items
					.and_then(Value::as_array)
					.into_iter()
					.flatten()
					.map(|item| el.li(item)),
			)
		})
	}

	#[test]
	fn test_ssr_options_default() {
		let opts = SsrOptions::default();
		assert!(opts.include_hydration_markers);
		assert!(!opts.minify);
		assert!(opts.include_state_script);
		assert_eq!(opts.lang, "en");
		assert_eq!(opts.root_id, "app");
	}

	#[test]
	fn test_ssr_options_builder() {
		let opts = SsrOptions::new().lang("ja").no_hydration().minify().root_id("root");
		assert_eq!(opts.lang, "ja");
		assert!(!opts.include_hydration_markers);
		assert!(opts.minify);
		assert_eq!(opts.root_id, "root");
	}

	#[test]
	fn test_render_records_state() {
		let mut renderer = SsrRenderer::new();
		let html = renderer.render(&bound_list(), json!({"items": ["one", "two"]}));

		assert_eq!(
			html,
			"<ul data-bd-id=\"b0\" data-bd-bind=\"items\"><li>one</li><li>two</li></ul>"
		);
		assert_eq!(renderer.state().data(), &json!({"items": ["one", "two"]}));
		assert_eq!(renderer.state().bindings()[0].path, "items");
	}

	#[test]
	fn test_render_without_markers() {
		let mut renderer = SsrRenderer::with_options(SsrOptions::new().no_hydration());
		let html = renderer.render(&bound_list(), json!({"items": ["x"]}));
		assert_eq!(html, "<ul><li>x</li></ul>");
	}

	#[test]
	fn test_render_page_wraps_content() {
		let mut renderer = SsrRenderer::new();
		let html = renderer.render_page(&span("hi"), json!({}));

		assert!(html.starts_with("<!DOCTYPE html>"));
		assert!(html.contains("<html lang=\"en\">"));
		assert!(html.contains("<div id=\"app\"><span>hi</span></div>"));
		assert!(!html.contains("bd-state"));
	}

	#[test]
	fn test_render_page_includes_state_script() {
		let mut renderer = SsrRenderer::new();
		let html = renderer.render_page(&bound_list(), json!({"items": ["a"]}));
		assert!(html.contains("<script id=\"bd-state\" type=\"application/json\">"));
		assert_eq!(
			SsrState::extract(&html).unwrap().map(|s| s.data().clone()),
			Some(json!({"items": ["a"]}))
		);
	}

	#[test]
	fn test_requests_do_not_share_state() {
		let first = render_to_string(&bound_list(), json!({"items": ["a"]}));
		let second = render_to_string(&bound_list(), json!({}));
		assert!(first.contains("<li>a</li>"));
		assert!(!second.contains("<li>"));
	}

	#[test]
	fn test_render_plain_list() {
		let node = ul(vec![li("a"), li("b")]);
		assert_eq!(render_to_string(&node, json!({})), "<ul><li>a</li><li>b</li></ul>");
	}

	#[test]
	fn test_map_shorthand_if_false_renders_nothing() {
		let node = div(vec![span(json!({"if": false, "text": "x"})), span("y")]);
		assert_eq!(render_to_string(&node, json!({})), "<div><span>y</span></div>");
	}

	#[test]
	fn test_map_shorthand_node_keys_are_not_attributes() {
		let node = span(json!({"if": true, "binding": "user", "class": "c"}));

		let html = render_to_string(&node, json!({"user": {}}));

		assert_eq!(
			html,
			"<span class=\"c\" data-bd-id=\"b0\" data-bd-bind=\"user\"></span>"
		);
	}

	#[rstest]
	#[case("<p>  a  </p>", "<p> a </p>")]
	#[case("<pre>  a\n  b</pre>  <p>", "<pre>  a\n  b</pre> <p>")]
	#[case("<pre class=\"x\">  k</pre>", "<pre class=\"x\">  k</pre>")]
	#[case("<preview>  x</preview>", "<preview> x</preview>")]
	fn test_minify_html(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(minify_html(input), expected);
	}

	#[test]
	fn test_minify_html_passes_large_input_through() {
		let input = " ".repeat(MINIFY_HTML_MAX_INPUT_SIZE + 1);
		assert_eq!(minify_html(&input), input);
	}
}
