//! Pipe contexts: auxiliary values handed to binding functions.
//!
//! A node declares its pipe as an ordered list of named entries. Plain values
//! and functions are used as-is on both targets. A module descriptor
//! (`{data, path}`) uses `data` for the first render and records `path` so that
//! the client can re-import the live export by name before it re-renders the
//! binding.

use crate::error::Result;
use crate::hydration::modules::ModuleCache;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A function value carried in a pipe.
pub type PipeFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// A resolved pipe value: a literal or a function.
#[derive(Clone)]
pub enum PipeValue {
	/// A literal JSON value.
	Value(Value),
	/// A callable helper.
	Func(PipeFn),
}

impl PipeValue {
	/// Wraps a closure.
	pub fn func(f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
		Self::Func(Arc::new(f))
	}

	/// Returns the literal, if this is one.
	pub fn as_value(&self) -> Option<&Value> {
		match self {
			Self::Value(value) => Some(value),
			Self::Func(_) => None,
		}
	}

	/// Applies the function to `arg`. A literal ignores `arg` and returns itself.
	pub fn call(&self, arg: &Value) -> Value {
		match self {
			Self::Value(value) => value.clone(),
			Self::Func(f) => f(arg),
		}
	}
}

impl fmt::Debug for PipeValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
			Self::Func(_) => f.write_str("Func(..)"),
		}
	}
}

impl From<Value> for PipeValue {
	fn from(value: Value) -> Self {
		Self::Value(value)
	}
}

/// One declared pipe entry.
#[derive(Debug, Clone)]
pub enum PipeEntry {
	/// A value or function used directly.
	Direct(PipeValue),
	/// A server-described export: `data` now, `path` for client re-import.
	Module {
		/// Value used until the module is re-imported.
		data: PipeValue,
		/// Module path to import on the client.
		path: String,
	},
}

/// The pipe declared on a node.
#[derive(Debug, Clone, Default)]
pub struct Pipe {
	entries: Vec<(String, PipeEntry)>,
}

impl Pipe {
	/// Creates an empty pipe.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a literal value.
	pub fn value(self, name: impl Into<String>, value: Value) -> Self {
		self.entry(name, PipeEntry::Direct(PipeValue::Value(value)))
	}

	/// Adds a function.
	pub fn func(
		self,
		name: impl Into<String>,
		f: impl Fn(&Value) -> Value + Send + Sync + 'static,
	) -> Self {
		self.entry(name, PipeEntry::Direct(PipeValue::func(f)))
	}

	/// Adds a `{data, path}` module descriptor.
	pub fn module(
		self,
		name: impl Into<String>,
		path: impl Into<String>,
		data: impl Into<PipeValue>,
	) -> Self {
		self.entry(
			name,
			PipeEntry::Module {
				data: data.into(),
				path: path.into(),
			},
		)
	}

	/// Adds an entry, replacing any previous entry with the same name.
	pub fn entry(mut self, name: impl Into<String>, entry: PipeEntry) -> Self {
		let name = name.into();
		match self.entries.iter_mut().find(|(n, _)| *n == name) {
			Some(slot) => slot.1 = entry,
			None => self.entries.push((name, entry)),
		}
		self
	}

	/// Declared entries in order.
	pub fn entries(&self) -> &[(String, PipeEntry)] {
		&self.entries
	}

	/// Export name -> module path for every module descriptor.
	pub fn module_paths(&self) -> BTreeMap<String, String> {
		self.entries
			.iter()
			.filter_map(|(name, entry)| match entry {
				PipeEntry::Module { path, .. } => Some((name.clone(), path.clone())),
				PipeEntry::Direct(_) => None,
			})
			.collect()
	}

	/// `true` if no entries are declared.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// The concrete name -> value mapping passed to binding functions.
///
/// Built once when a binding registers and reused across its re-renders.
#[derive(Debug, Clone, Default)]
pub struct PipeContext {
	values: BTreeMap<String, PipeValue>,
	pending: BTreeMap<String, String>,
}

impl PipeContext {
	/// An empty context.
	pub fn empty() -> Self {
		Self::default()
	}

	/// Materializes a declared pipe. Module descriptors contribute their
	/// `data` and stay pending until [`rehydrate`](Self::rehydrate) succeeds.
	pub fn from_pipe(pipe: Option<&Pipe>) -> Self {
		let mut context = Self::default();
		let Some(pipe) = pipe else {
			return context;
		};
		for (name, entry) in pipe.entries() {
			match entry {
				PipeEntry::Direct(value) => {
					context.values.insert(name.clone(), value.clone());
				}
				PipeEntry::Module { data, path } => {
					context.values.insert(name.clone(), data.clone());
					context.pending.insert(name.clone(), path.clone());
				}
			}
		}
		context
	}

	/// Looks up an entry.
	pub fn get(&self, name: &str) -> Option<&PipeValue> {
		self.values.get(name)
	}

	/// Looks up a literal entry.
	pub fn value(&self, name: &str) -> Option<&Value> {
		self.get(name).and_then(PipeValue::as_value)
	}

	/// Calls the entry `name` with `arg`; `None` if no such entry.
	pub fn call(&self, name: &str, arg: &Value) -> Option<Value> {
		self.get(name).map(|entry| entry.call(arg))
	}

	/// `true` while some module descriptor has not been re-imported.
	pub fn is_pending(&self) -> bool {
		!self.pending.is_empty()
	}

	/// Re-imports every pending module export through `modules`.
	///
	/// Either all pending entries are replaced by their live exports or, on
	/// the first failure, the context is left exactly as it was.
	pub fn rehydrate(&mut self, modules: &ModuleCache) -> Result<()> {
		let mut resolved = Vec::with_capacity(self.pending.len());
		for (name, path) in &self.pending {
			resolved.push((name.clone(), modules.export(path, name)?));
		}
		for (name, value) in resolved {
			self.values.insert(name, value);
		}
		self.pending.clear();
		Ok(())
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.values.len()
	}

	/// `true` if the context has no entries.
	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}
}
