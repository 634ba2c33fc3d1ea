//! Template modules and the server-side registry.
//!
//! A [`TemplateModule`] is what a view file exports: a default function
//! `(data) -> Node`, optional named layouts `(data, content) -> Node`, and
//! named exports that pipes re-import on the client. The
//! [`TemplateRegistry`] maps module paths to modules. It answers
//! `render(name, data)` for the HTTP layer and doubles as the
//! [`ModuleResolver`] import hook.
//!
//! ## Example
//!
//! ```
//! use bindery_pages::builder::html::{div, h1};
//! use bindery_pages::template::{TemplateModule, TemplateRegistry};
//! use serde_json::json;
//!
//! let registry = TemplateRegistry::new();
//! registry.register(
//!     "pages/home",
//!     TemplateModule::new(|data| h1(data["title"].as_str().unwrap_or_default()))
//!         .layout("shell", |_, content| div(vec![content]).class("shell")),
//! );
//!
//! let html = registry
//!     .render_with_layout("pages/home", "shell", json!({"title": "Hi"}))
//!     .unwrap();
//! assert_eq!(html, "<div class=\"shell\"><h1>Hi</h1></div>");
//! ```

use crate::component::Node;
use crate::error::{Error, Result};
use crate::hydration::modules::ModuleResolver;
use crate::pipe::PipeValue;
use crate::ssr::{SsrOptions, SsrRenderer};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A template's default function.
pub type TemplateFn = Arc<dyn Fn(&Value) -> Node + Send + Sync>;

/// A layout function wrapping rendered content.
pub type LayoutFn = Arc<dyn Fn(&Value, Node) -> Node + Send + Sync>;

/// The exports of one template module.
#[derive(Clone)]
pub struct TemplateModule {
	default: TemplateFn,
	layouts: HashMap<String, LayoutFn>,
	exports: HashMap<String, PipeValue>,
}

impl fmt::Debug for TemplateModule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut layouts: Vec<&String> = self.layouts.keys().collect();
		layouts.sort();
		let mut exports: Vec<&String> = self.exports.keys().collect();
		exports.sort();
		f.debug_struct("TemplateModule")
			.field("layouts", &layouts)
			.field("exports", &exports)
			.finish_non_exhaustive()
	}
}

impl TemplateModule {
	/// Creates a module from its default function.
	pub fn new(default: impl Fn(&Value) -> Node + Send + Sync + 'static) -> Self {
		Self {
			default: Arc::new(default),
			layouts: HashMap::new(),
			exports: HashMap::new(),
		}
	}

	/// Adds a named layout.
	pub fn layout(
		mut self,
		name: impl Into<String>,
		layout: impl Fn(&Value, Node) -> Node + Send + Sync + 'static,
	) -> Self {
		self.layouts.insert(name.into(), Arc::new(layout));
		self
	}

	/// Adds a named export.
	pub fn export(mut self, name: impl Into<String>, value: impl Into<PipeValue>) -> Self {
		self.exports.insert(name.into(), value.into());
		self
	}

	/// Adds a named function export.
	pub fn export_fn(
		self,
		name: impl Into<String>,
		f: impl Fn(&Value) -> Value + Send + Sync + 'static,
	) -> Self {
		self.export(name, PipeValue::func(f))
	}

	/// Builds the module's default node for `data`.
	pub fn build(&self, data: &Value) -> Node {
		(self.default)(data)
	}

	/// Looks up a layout.
	pub fn get_layout(&self, name: &str) -> Option<&LayoutFn> {
		self.layouts.get(name)
	}

	/// Looks up an export.
	pub fn get_export(&self, name: &str) -> Option<&PipeValue> {
		self.exports.get(name)
	}
}

/// Thread-safe map of module path to [`TemplateModule`].
///
/// Cloning shares the same modules.
#[derive(Clone, Default)]
pub struct TemplateRegistry {
	modules: Arc<RwLock<HashMap<String, Arc<TemplateModule>>>>,
	options: SsrOptions,
}

impl fmt::Debug for TemplateRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TemplateRegistry")
			.field("modules", &self.modules.read().len())
			.field("options", &self.options)
			.finish()
	}
}

impl TemplateRegistry {
	/// Creates an empty registry with default rendering options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates an empty registry with custom rendering options.
	pub fn with_options(options: SsrOptions) -> Self {
		Self {
			modules: Arc::default(),
			options,
		}
	}

	/// Registers (or replaces) the module at `path`.
	pub fn register(&self, path: impl Into<String>, module: TemplateModule) {
		self.modules.write().insert(path.into(), Arc::new(module));
	}

	/// Looks up the module at `path`.
	pub fn get(&self, path: &str) -> Result<Arc<TemplateModule>> {
		self.modules
			.read()
			.get(path)
			.cloned()
			.ok_or_else(|| Error::UnknownTemplate(path.to_string()))
	}

	/// `true` if a module is registered at `path`.
	pub fn contains(&self, path: &str) -> bool {
		self.modules.read().contains_key(path)
	}

	/// Registered module paths, sorted.
	pub fn paths(&self) -> Vec<String> {
		let mut paths: Vec<String> = self.modules.read().keys().cloned().collect();
		paths.sort();
		paths
	}

	/// Builds the node for `name`, wrapped by `layouts` from innermost to
	/// outermost.
	pub fn compose(&self, name: &str, layouts: &[&str], data: &Value) -> Result<Node> {
		let module = self.get(name)?;
		layouts.iter().try_fold(module.build(data), |content, layout| {
			let wrap = module.get_layout(layout).ok_or_else(|| Error::UnknownLayout {
				template: name.to_string(),
				layout: layout.to_string(),
			})?;
			Ok(wrap(data, content))
		})
	}

	/// Renders the module's default function against `data` to a fragment.
	pub fn render(&self, name: &str, data: Value) -> Result<String> {
		self.render_composed(name, &[], data, false)
	}

	/// Renders the module's content wrapped in one of its layouts.
	pub fn render_with_layout(&self, name: &str, layout: &str, data: Value) -> Result<String> {
		self.render_composed(name, &[layout], data, false)
	}

	/// Renders the module to a full page with its state script.
	pub fn render_page(&self, name: &str, data: Value) -> Result<String> {
		self.render_composed(name, &[], data, true)
	}

	/// Renders the module wrapped in `layouts` to a full page.
	pub fn render_page_with_layouts(
		&self,
		name: &str,
		layouts: &[&str],
		data: Value,
	) -> Result<String> {
		self.render_composed(name, layouts, data, true)
	}

	fn render_composed(
		&self,
		name: &str,
		layouts: &[&str],
		data: Value,
		page: bool,
	) -> Result<String> {
		let node = self.compose(name, layouts, &data)?;
		debug!(template = name, layouts = layouts.len(), page, "rendering template");
		let mut renderer = SsrRenderer::with_options(self.options.clone());
		Ok(if page {
			renderer.render_page(&node, data)
		} else {
			renderer.render(&node, data)
		})
	}
}

impl ModuleResolver for TemplateRegistry {
	fn resolve(&self, path: &str) -> Result<Arc<TemplateModule>> {
		self.get(path)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::builder::html::{div, main, p, span};
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn registry() -> TemplateRegistry {
		let registry = TemplateRegistry::with_options(SsrOptions::new().no_hydration());
		registry.register(
			"views/greeting",
			TemplateModule::new(|data| p(data["name"].as_str().unwrap_or("nobody")))
				.layout("card", |_, content| div(vec![content]).class("card"))
				.layout("page", |data, content| {
					main(vec![content]).attr("data-user", data["name"].clone())
				})
				.export("greeting", json!("hello")),
		);
		registry
	}

	#[rstest]
	fn test_render_default(registry: TemplateRegistry) {
		let html = registry.render("views/greeting", json!({"name": "Ada"})).unwrap();
		assert_eq!(html, "<p>Ada</p>");
	}

	#[rstest]
	fn test_render_nested_layouts(registry: TemplateRegistry) {
		let html = registry
			.render_composed("views/greeting", &["card", "page"], json!({"name": "Ada"}), false)
			.unwrap();
		assert_eq!(
			html,
			"<main data-user=\"Ada\"><div class=\"card\"><p>Ada</p></div></main>"
		);
	}

	#[rstest]
	fn test_unknown_template(registry: TemplateRegistry) {
		let err = registry.render("views/missing", json!({})).unwrap_err();
		assert!(matches!(err, Error::UnknownTemplate(name) if name == "views/missing"));
	}

	#[rstest]
	fn test_unknown_layout(registry: TemplateRegistry) {
		let err = registry
			.render_with_layout("views/greeting", "sidebar", json!({}))
			.unwrap_err();
		assert!(matches!(err, Error::UnknownLayout { layout, .. } if layout == "sidebar"));
	}

	#[rstest]
	fn test_render_page(registry: TemplateRegistry) {
		let html = registry.render_page("views/greeting", json!({"name": "Ada"})).unwrap();
		assert!(html.contains("<div id=\"app\"><p>Ada</p></div>"));
		assert!(html.contains("bd-state"));
	}

	#[rstest]
	fn test_resolves_exports(registry: TemplateRegistry) {
		let module = registry.resolve("views/greeting").unwrap();
		assert_eq!(
			module.get_export("greeting").and_then(PipeValue::as_value),
			Some(&json!("hello"))
		);
	}

	#[test]
	fn test_registry_is_shared_across_threads() {
		let registry = TemplateRegistry::new();
		let writer = registry.clone();
		std::thread::spawn(move || {
			writer.register("views/t", TemplateModule::new(|_| span("t")));
		})
		.join()
		.unwrap();
		assert_eq!(registry.paths(), vec!["views/t".to_string()]);
	}
}
