//! Module import hook and the client-side module cache.
//!
//! Module paths are immutable once declared, so a resolved module is cached
//! by path for the lifetime of the cache and never invalidated. Failed
//! imports are not cached; the next re-render of the affected binding tries
//! again.

use crate::error::{Error, Result};
use crate::pipe::PipeValue;
use crate::template::TemplateModule;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Imports the module at a path.
pub trait ModuleResolver {
	/// Returns the module at `path`, or [`Error::Resolution`] /
	/// [`Error::UnknownTemplate`] when it cannot be imported.
	fn resolve(&self, path: &str) -> Result<Arc<TemplateModule>>;
}

impl<F> ModuleResolver for F
where
	F: Fn(&str) -> Result<Arc<TemplateModule>>,
{
	fn resolve(&self, path: &str) -> Result<Arc<TemplateModule>> {
		self(path)
	}
}

/// A resolver that knows no modules.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoModules;

impl ModuleResolver for NoModules {
	fn resolve(&self, path: &str) -> Result<Arc<TemplateModule>> {
		Err(Error::UnknownTemplate(path.to_string()))
	}
}

/// Path-keyed cache in front of a [`ModuleResolver`].
pub struct ModuleCache {
	resolver: Arc<dyn ModuleResolver>,
	modules: RefCell<HashMap<String, Arc<TemplateModule>>>,
}

impl fmt::Debug for ModuleCache {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ModuleCache")
			.field("cached", &self.modules.borrow().len())
			.finish_non_exhaustive()
	}
}

impl Default for ModuleCache {
	fn default() -> Self {
		Self::new(Arc::new(NoModules))
	}
}

impl ModuleCache {
	/// Creates an empty cache in front of `resolver`.
	pub fn new(resolver: Arc<dyn ModuleResolver>) -> Self {
		Self {
			resolver,
			modules: RefCell::new(HashMap::new()),
		}
	}

	/// Returns the module at `path`, importing it on first use.
	pub fn module(&self, path: &str) -> Result<Arc<TemplateModule>> {
		if let Some(module) = self.modules.borrow().get(path) {
			return Ok(Arc::clone(module));
		}
		trace!(path, "importing module");
		let module = self.resolver.resolve(path).map_err(|err| match err {
			err @ Error::Resolution { .. } => err,
			other => Error::Resolution {
				path: path.to_string(),
				export: String::new(),
				reason: other.to_string(),
			},
		})?;
		self.modules
			.borrow_mut()
			.insert(path.to_string(), Arc::clone(&module));
		Ok(module)
	}

	/// Returns the export `name` of the module at `path`.
	pub fn export(&self, path: &str, name: &str) -> Result<PipeValue> {
		let module = self.module(path).map_err(|err| match err {
			Error::Resolution { path, reason, .. } => Error::Resolution {
				path,
				export: name.to_string(),
				reason,
			},
			other => other,
		})?;
		module
			.get_export(name)
			.cloned()
			.ok_or_else(|| Error::Resolution {
				path: path.to_string(),
				export: name.to_string(),
				reason: "module has no such export".to_string(),
			})
	}

	/// `true` if the module at `path` has been imported.
	pub fn is_cached(&self, path: &str) -> bool {
		self.modules.borrow().contains_key(path)
	}

	/// Number of imported modules.
	pub fn len(&self) -> usize {
		self.modules.borrow().len()
	}

	/// `true` if nothing has been imported yet.
	pub fn is_empty(&self) -> bool {
		self.modules.borrow().is_empty()
	}
}
