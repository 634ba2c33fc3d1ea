//! Client runtime
//!
//! A [`Client`] owns the page's store, the binding registry, the in-memory
//! [`Document`] and the module cache. It subscribes to its own store: every
//! successful `set`, `push` or `remove` selects the affected registrations
//! and replaces each one's element in place before the mutating call
//! returns.
//!
//! One client per thread is kept by [`install`] / [`current`]; the first
//! call to [`render`] establishes it and it lives for the rest of the page.
//!
//! ## Example
//!
//! ```
//! use bindery_pages::builder::html::ul;
//! use bindery_pages::client::{Client, Target};
//! use bindery_pages::component::PropValue;
//! use serde_json::{Value, json};
//!
//! let client = Client::new();
//! client.store().set("test", json!({"children": ["one", "two"]})).unwrap();
//!
//! let list = ul(()).bind("test").bound("children", |test, el, _| {
//!     let items = test.and_then(|t| t.get("children")).and_then(Value::as_array);
//!     PropValue::children(items.into_iter().flatten().map(|item| el.li(item)))
//! });
//! client.render(&list, None, Target::Attach(client.body()));
//!
//! client.store().push("test.children", json!("three")).unwrap();
//!
//! let html = client.inner_html(client.body());
//! assert!(html.ends_with("<li>one</li><li>two</li><li>three</li></ul>"));
//! ```

use crate::binding::{NewBinding, RegKey, Registry};
use crate::component::Node;
use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};
use crate::hydration::{HydrationContext, HydrationError, ModuleCache, ModuleResolver};
use crate::path::Path;
use crate::render::{DomBuilder, Engine};
use crate::ssr::{BindingRecord, IdAllocator};
use crate::store::{Store, Subscriber};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

/// Options for the client runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
	/// Deepest allowed nesting of re-entrant notifications.
	pub max_notify_depth: usize,
	/// Whether client-rendered elements carry `data-bd-*` markers.
	pub hydration_markers: bool,
}

impl Default for ClientOptions {
	fn default() -> Self {
		Self {
			max_notify_depth: 32,
			hydration_markers: true,
		}
	}
}

/// Where a rendered tree goes.
pub enum Target {
	/// Append the root to this element once the tree is complete.
	Attach(NodeId),
	/// Hand the completed root to a callback.
	Callback(Box<dyn FnOnce(&Client, NodeId)>),
	/// Leave the root detached.
	Detached,
}

impl Target {
	/// Wraps a callback.
	pub fn callback(f: impl FnOnce(&Client, NodeId) + 'static) -> Self {
		Self::Callback(Box::new(f))
	}
}

impl fmt::Debug for Target {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Attach(id) => f.debug_tuple("Attach").field(id).finish(),
			Self::Callback(_) => f.write_str("Callback(..)"),
			Self::Detached => f.write_str("Detached"),
		}
	}
}

type ErrorHook = Rc<dyn Fn(&Error)>;

struct ClientInner {
	store: Store,
	registry: RefCell<Registry<NodeId>>,
	document: RefCell<Document>,
	modules: ModuleCache,
	options: ClientOptions,
	reporter: RefCell<Option<ErrorHook>>,
	/// Registrations currently re-rendering, outermost first.
	active: RefCell<Vec<RegKey>>,
	depth: Cell<usize>,
	/// Set once a notification chain has failed with a cycle.
	aborted: RefCell<Option<(String, usize)>>,
	next_root: Cell<usize>,
}

/// Handle to the client runtime. Cloning shares the same runtime.
#[derive(Clone)]
pub struct Client {
	inner: Rc<ClientInner>,
}

impl Default for Client {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for Client {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Client")
			.field("store", &self.inner.store)
			.field("bindings", &self.inner.registry.borrow().len())
			.field("options", &self.inner.options)
			.finish_non_exhaustive()
	}
}

impl Client {
	/// Creates a client with default options and no module resolver.
	pub fn new() -> Self {
		Self::build(ClientOptions::default(), ModuleCache::default())
	}

	/// Creates a client with custom options.
	pub fn with_options(options: ClientOptions) -> Self {
		Self::build(options, ModuleCache::default())
	}

	/// Creates a client that re-imports pipe modules through `resolver`.
	pub fn with_resolver(options: ClientOptions, resolver: Arc<dyn ModuleResolver>) -> Self {
		Self::build(options, ModuleCache::new(resolver))
	}

	fn build(options: ClientOptions, modules: ModuleCache) -> Self {
		let inner = Rc::new_cyclic(|weak: &Weak<ClientInner>| {
			let store = Store::new();
			let subscriber: Weak<dyn Subscriber> = weak.clone();
			store.subscribe(subscriber);
			ClientInner {
				store,
				registry: RefCell::new(Registry::new()),
				document: RefCell::new(Document::new()),
				modules,
				options,
				reporter: RefCell::new(None),
				active: RefCell::new(Vec::new()),
				depth: Cell::new(0),
				aborted: RefCell::new(None),
				next_root: Cell::new(0),
			}
		});
		Self { inner }
	}

	/// The page store.
	pub fn store(&self) -> &Store {
		&self.inner.store
	}

	/// The runtime options.
	pub fn options(&self) -> &ClientOptions {
		&self.inner.options
	}

	/// The module cache used for pipe re-imports.
	pub fn modules(&self) -> &ModuleCache {
		&self.inner.modules
	}

	/// The document's `<body>`.
	pub fn body(&self) -> NodeId {
		self.inner.document.borrow().body()
	}

	/// Runs `f` against the document.
	///
	/// `f` must not mutate the store.
	pub fn document<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
		f(&self.inner.document.borrow())
	}

	/// Serializes `id` including its own tag.
	pub fn outer_html(&self, id: NodeId) -> String {
		self.inner.document.borrow().outer_html(id)
	}

	/// Serializes the children of `id`.
	pub fn inner_html(&self, id: NodeId) -> String {
		self.inner.document.borrow().inner_html(id)
	}

	/// Number of live binding registrations.
	pub fn binding_count(&self) -> usize {
		self.inner.registry.borrow().len()
	}

	/// Installs the host error reporter.
	///
	/// It receives errors that are contained to a single binding, such as a
	/// pipe module that cannot be re-imported.
	pub fn on_error(&self, hook: impl Fn(&Error) + 'static) {
		*self.inner.reporter.borrow_mut() = Some(Rc::new(hook));
	}

	/// Renders `node` into the document.
	///
	/// `data` is merged into the store first, without notifying. Returns the
	/// root element, or `None` when the node's `if` is false.
	pub fn render(&self, node: &Node, data: Option<Value>, target: Target) -> Option<NodeId> {
		let inner = &self.inner;
		if let Some(data) = data {
			inner.store.seed(data);
		}

		let ids = IdAllocator::starting_at(inner.next_root.get());
		let (root, bindings, ids) = inner.build_detached(node, ids);
		inner.next_root.set(ids.next_root());

		let root = root?;
		let registered = inner.registry.borrow_mut().extend(bindings).len();
		debug!(tag = node.tag(), root = %root, registered, "rendered node");

		match target {
			Target::Attach(parent) => {
				inner.document.borrow_mut().append(parent, root);
			}
			Target::Callback(f) => f(self, root),
			Target::Detached => {}
		}
		Some(root)
	}

	/// Takes over server-rendered content below `root`.
	///
	/// Seeds the store from the SSR state without notifying, rebuilds the
	/// content of `root` from `node`, and checks the result against the
	/// server markup and binding records carried by `context`. On mismatch
	/// the rebuilt content stays in place and the mismatch is returned.
	pub fn hydrate(
		&self,
		root: NodeId,
		node: &Node,
		context: &mut HydrationContext,
	) -> std::result::Result<Option<NodeId>, HydrationError> {
		let inner = &self.inner;
		if !inner.document.borrow().contains(root) {
			return Err(HydrationError::RootNotFound(root.to_string()));
		}

		let data = match context.state().data() {
			Value::Null => Value::Object(Map::new()),
			data => data.clone(),
		};
		inner.store.replace_root(data);
		inner.document.borrow_mut().clear_children(root);
		inner.prune();

		let (rendered, bindings, ids) = inner.build_detached(node, IdAllocator::new());
		inner
			.next_root
			.set(inner.next_root.get().max(ids.next_root()));
		if let Some(rendered) = rendered {
			inner.document.borrow_mut().append(root, rendered);
		}
		// Only registrations made by this pass are matched against the server
		// records; earlier renders may have used the same ids.
		let hydrated: Vec<BindingRecord> = bindings.iter().map(BindingRecord::from).collect();
		inner.registry.borrow_mut().extend(bindings);

		if let Some(expected) = context.markup() {
			let actual = self.inner_html(root);
			if actual != expected {
				warn!(root = %root, "hydrated markup differs from server markup");
				return Err(HydrationError::StructureMismatch {
					id: root.to_string(),
					expected: expected.to_string(),
					actual,
				});
			}
		}

		for record in context.state().bindings() {
			let found = hydrated.iter().find(|r| r.id == record.id);
			if found != Some(record) {
				warn!(id = %record.id, "server binding has no matching client binding");
				return Err(HydrationError::StructureMismatch {
					id: record.id.clone(),
					expected: describe_record(record),
					actual: found.map_or_else(|| "nothing".to_string(), describe_record),
				});
			}
		}

		context.mark_hydrated();
		debug!(root = %root, bindings = self.binding_count(), "hydration complete");
		Ok(rendered)
	}

	/// Hydrates the element whose `id` attribute is `root_id`.
	pub fn hydrate_by_id(
		&self,
		root_id: &str,
		node: &Node,
		context: &mut HydrationContext,
	) -> std::result::Result<Option<NodeId>, HydrationError> {
		let root = self
			.document(|doc| doc.element_by_id(root_id))
			.ok_or_else(|| HydrationError::RootNotFound(root_id.to_string()))?;
		self.hydrate(root, node, context)
	}

	/// Removes `element` and drops every registration inside it.
	pub fn remove(&self, element: NodeId) -> bool {
		let removed = self.inner.document.borrow_mut().remove(element);
		if removed {
			let pruned = self.inner.prune();
			trace!(element = %element, pruned, "removed element");
		}
		removed
	}
}

/// `path` followed by its pipe modules, if any.
fn describe_record(record: &BindingRecord) -> String {
	if record.pipe.is_empty() {
		return record.path.clone();
	}
	let modules: Vec<String> = record
		.pipe
		.iter()
		.map(|(name, path)| format!("{}={}", name, path))
		.collect();
	format!("{} [{}]", record.path, modules.join(", "))
}

impl ClientInner {
	fn build_detached(
		&self,
		node: &Node,
		ids: IdAllocator,
	) -> (Option<NodeId>, Vec<NewBinding<NodeId>>, IdAllocator) {
		let mut builder = DomBuilder::new(&self.document);
		let mut engine = Engine::new(&mut builder, &self.store, ids, self.options.hydration_markers);
		let root = engine.render(node);
		let (bindings, ids) = engine.finish();
		(root, bindings, ids)
	}

	/// Drops registrations whose element has been freed.
	fn prune(&self) -> usize {
		let document = self.document.borrow();
		self.registry
			.borrow_mut()
			.retain(|r| document.contains(r.element))
	}

	fn report(&self, err: &Error) {
		error!(error = %err, "binding skipped, keeping previous output");
		let hook = self.reporter.borrow().clone();
		if let Some(hook) = hook {
			hook(err);
		}
	}

	fn abort(&self, path: &Path, depth: usize) -> Error {
		warn!(path = %path, depth, "cyclic binding, aborting notification chain");
		*self.aborted.borrow_mut() = Some((path.to_string(), depth));
		Error::CyclicBinding {
			path: path.to_string(),
			depth,
		}
	}

	fn check_aborted(&self) -> Result<()> {
		match &*self.aborted.borrow() {
			Some((path, depth)) => Err(Error::CyclicBinding {
				path: path.clone(),
				depth: *depth,
			}),
			None => Ok(()),
		}
	}

	fn notify_affected(&self, store: &Store, path: &Path, depth: usize) -> Result<()> {
		let affected = self.registry.borrow().affected(path);
		debug!(path = %path, depth, affected = affected.len(), "store changed");

		for key in affected {
			if self.active.borrow().contains(&key) {
				let bound = self
					.registry
					.borrow()
					.get(key)
					.map_or_else(|| path.clone(), |r| r.path.clone());
				return Err(self.abort(&bound, depth));
			}

			self.active.borrow_mut().push(key);
			let result = self.rerender(store, key);
			self.active.borrow_mut().pop();
			result?;
			self.check_aborted()?;
		}
		Ok(())
	}

	fn rerender(&self, store: &Store, key: RegKey) -> Result<()> {
		let Some(registration) = self.registry.borrow().get(key).cloned() else {
			trace!(key = %key, "registration removed before re-render");
			return Ok(());
		};
		if !self.document.borrow().contains(registration.element) {
			warn!(id = %registration.id, "skipping registration whose element is gone");
			return Ok(());
		}

		let mut pipe = registration.pipe;
		if pipe.is_pending() {
			if let Err(err) = pipe.rehydrate(&self.modules) {
				self.report(&err);
				return Ok(());
			}
			if let Some(live) = self.registry.borrow_mut().get_mut(key) {
				live.pipe = pipe.clone();
			}
		}

		let value = store.get(&registration.path);
		trace!(
			id = %registration.id,
			path = %registration.path,
			absent = value.is_none(),
			"re-rendering binding"
		);

		let mut builder = DomBuilder::new(&self.document);
		let mut engine = Engine::new(
			&mut builder,
			store,
			IdAllocator::new(),
			self.options.hydration_markers,
		);
		let fresh = engine.rerender(
			&registration.id,
			&registration.path,
			&registration.node,
			&pipe,
			value.as_ref(),
		);
		let (bindings, _) = engine.finish();

		{
			let mut document = self.document.borrow_mut();
			// A nested re-render may already have replaced an ancestor.
			if !document.contains(registration.element) {
				document.remove(fresh);
				return Ok(());
			}
			document.replace(registration.element, fresh);
		}

		let pruned = {
			let mut registry = self.registry.borrow_mut();
			if let Some(live) = registry.get_mut(key) {
				live.element = fresh;
			}
			registry.insert_after(key, bindings);
			let document = self.document.borrow();
			registry.retain(|r| document.contains(r.element))
		};
		trace!(id = %registration.id, pruned, "binding re-rendered");
		Ok(())
	}
}

impl Subscriber for ClientInner {
	fn notify(&self, store: &Store, path: &Path) -> Result<()> {
		let depth = self.depth.get();
		if depth >= self.options.max_notify_depth {
			return Err(self.abort(path, depth));
		}

		self.depth.set(depth + 1);
		let result = self.notify_affected(store, path, depth);
		self.depth.set(depth);

		if depth == 0 {
			self.aborted.borrow_mut().take();
		}
		result
	}
}

thread_local! {
	static CURRENT: RefCell<Option<Client>> = const { RefCell::new(None) };
}

/// Makes `client` the current client of this thread, returning the previous one.
pub fn install(client: Client) -> Option<Client> {
	CURRENT.with(|current| current.borrow_mut().replace(client))
}

/// The current client of this thread, if one is installed.
pub fn current() -> Option<Client> {
	CURRENT.with(|current| current.borrow().clone())
}

/// The current client of this thread, installing a default one if needed.
pub fn current_or_init() -> Client {
	CURRENT.with(|current| current.borrow_mut().get_or_insert_with(Client::new).clone())
}

/// Renders through the current client, establishing it on first use.
pub fn render(node: &Node, data: Option<Value>, target: Target) -> Option<NodeId> {
	current_or_init().render(node, data, target)
}
