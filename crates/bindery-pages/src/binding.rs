//! Binding registrations and specificity selection
//!
//! Every rendered node that carries a binding path leaves a [`Registration`]
//! behind: the path, the node description, the handle of the rendered
//! element and the pipe context built for it. When the store reports a
//! mutation, [`Registry::affected`] picks the registrations that must
//! re-render.
//!
//! ## Selection rule
//!
//! For a mutated path `P`, a registration is a candidate when its path is
//! related to `P` in either direction. Among candidates whose path is `P` or
//! one of its ancestors only the deepest ones fire; every candidate bound
//! below `P` fires. Registrations on unrelated paths never suppress each
//! other.
//!
//! ```
//! use bindery_pages::binding::select_affected;
//! use bindery_pages::path::Path;
//!
//! let bound = [Path::new("a"), Path::new("a.b")];
//!
//! assert_eq!(select_affected(&bound, &Path::new("a.b")), vec![1]);
//! assert_eq!(select_affected(&bound, &Path::new("a.c")), vec![0]);
//! assert_eq!(select_affected(&bound, &Path::new("a")), vec![0, 1]);
//! ```

use crate::component::Node;
use crate::path::Path;
use crate::pipe::PipeContext;
use std::fmt;

/// Stable identity of a registration.
///
/// The key survives re-renders of the registration's own element; nested
/// registrations rebuilt by a re-render get fresh keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegKey(u64);

impl fmt::Display for RegKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "reg-{}", self.0)
	}
}

/// A registration produced by a render pass, before it is keyed.
#[derive(Debug, Clone)]
pub struct NewBinding<H> {
	/// Marker id (`data-bd-id`).
	pub id: String,
	/// Bound path.
	pub path: Path,
	/// The node description to re-evaluate.
	pub node: Node,
	/// Handle of the rendered element.
	pub element: H,
	/// Pipe context built at registration time.
	pub pipe: PipeContext,
}

/// A live binding registration.
#[derive(Debug, Clone)]
pub struct Registration<H> {
	/// Stable key.
	pub key: RegKey,
	/// Marker id (`data-bd-id`).
	pub id: String,
	/// Bound path.
	pub path: Path,
	/// The node description to re-evaluate.
	pub node: Node,
	/// Handle of the currently rendered element.
	pub element: H,
	/// Pipe context, reused across re-renders.
	pub pipe: PipeContext,
}

/// Ordered set of live registrations.
///
/// Order is registration order: a parent's registration precedes the
/// registrations of its bound descendants.
#[derive(Debug)]
pub struct Registry<H> {
	entries: Vec<Registration<H>>,
	next_key: u64,
}

impl<H> Default for Registry<H> {
	fn default() -> Self {
		Self {
			entries: Vec::new(),
			next_key: 0,
		}
	}
}

impl<H: Clone> Registry<H> {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	fn keyed(&mut self, binding: NewBinding<H>) -> Registration<H> {
		let key = RegKey(self.next_key);
		self.next_key += 1;
		Registration {
			key,
			id: binding.id,
			path: binding.path,
			node: binding.node,
			element: binding.element,
			pipe: binding.pipe,
		}
	}

	/// Appends registrations in order and returns their keys.
	pub fn extend(&mut self, bindings: Vec<NewBinding<H>>) -> Vec<RegKey> {
		let mut keys = Vec::with_capacity(bindings.len());
		for binding in bindings {
			let registration = self.keyed(binding);
			keys.push(registration.key);
			self.entries.push(registration);
		}
		keys
	}

	/// Inserts registrations directly after `key`, keeping parent-first order.
	///
	/// Falls back to appending when `key` is no longer registered.
	pub fn insert_after(&mut self, key: RegKey, bindings: Vec<NewBinding<H>>) -> Vec<RegKey> {
		let Some(position) = self.position(key) else {
			return self.extend(bindings);
		};
		let registrations: Vec<Registration<H>> =
			bindings.into_iter().map(|b| self.keyed(b)).collect();
		let keys = registrations.iter().map(|r| r.key).collect();
		let at = position + 1;
		self.entries.splice(at..at, registrations);
		keys
	}

	fn position(&self, key: RegKey) -> Option<usize> {
		self.entries.iter().position(|r| r.key == key)
	}

	/// Looks up a registration.
	pub fn get(&self, key: RegKey) -> Option<&Registration<H>> {
		self.entries.iter().find(|r| r.key == key)
	}

	/// Looks up a registration for modification.
	pub fn get_mut(&mut self, key: RegKey) -> Option<&mut Registration<H>> {
		self.entries.iter_mut().find(|r| r.key == key)
	}

	/// Drops every registration for which `keep` returns `false`.
	///
	/// Returns the number of registrations removed.
	pub fn retain(&mut self, mut keep: impl FnMut(&Registration<H>) -> bool) -> usize {
		let before = self.entries.len();
		self.entries.retain(|r| keep(r));
		before - self.entries.len()
	}

	/// Keys of the registrations that must re-render after `mutated` changed,
	/// in registry order.
	pub fn affected(&self, mutated: &Path) -> Vec<RegKey> {
		select_affected(self.entries.iter().map(|r| &r.path), mutated)
			.into_iter()
			.map(|index| self.entries[index].key)
			.collect()
	}

	/// Live registrations in order.
	pub fn iter(&self) -> impl Iterator<Item = &Registration<H>> {
		self.entries.iter()
	}

	/// Number of live registrations.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// `true` if nothing is registered.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// Indices of the bound paths that fire for a mutation at `mutated`.
///
/// Among paths equal to or above `mutated` only the deepest fire. Paths
/// strictly below `mutated` always fire. Unrelated paths never fire.
pub fn select_affected<'a, I>(bound: I, mutated: &Path) -> Vec<usize>
where
	I: IntoIterator<Item = &'a Path>,
	I::IntoIter: Clone,
{
	let bound = bound.into_iter();
	let deepest_ancestor = bound
		.clone()
		.filter(|path| path.is_ancestor_or_equal(mutated))
		.map(Path::depth)
		.max();

	bound
		.enumerate()
		.filter(|(_, path)| {
			if path.is_ancestor_or_equal(mutated) {
				Some(path.depth()) == deepest_ancestor
			} else {
				mutated.is_strict_ancestor(path)
			}
		})
		.map(|(index, _)| index)
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::builder::html::div;
	use rstest::rstest;

	fn binding(path: &str, element: u32) -> NewBinding<u32> {
		NewBinding {
			id: format!("b{}", element),
			path: Path::new(path),
			node: div(()).bind(path),
			element,
			pipe: PipeContext::empty(),
		}
	}

	fn paths(raw: &[&str]) -> Vec<Path> {
		raw.iter().map(|p| Path::new(*p)).collect()
	}

	#[rstest]
	#[case(&["a", "a.b"], "a.b", vec![1])]
	#[case(&["a", "a.b"], "a.c", vec![0])]
	#[case(&["a", "a.b"], "a", vec![0, 1])]
	#[case(&["a", "a.b", "a.b.c"], "a.b.c.d", vec![2])]
	#[case(&["a.b", "a.c"], "a", vec![0, 1])]
	#[case(&["a", "b"], "a.x", vec![0])]
	#[case(&["a", "a"], "a.x", vec![0, 1])]
	#[case(&["x"], "a", vec![])]
	#[case(&["", "a"], "a", vec![1])]
	#[case(&["", "a"], "b", vec![0])]
	fn test_select_affected(
		#[case] bound: &[&str],
		#[case] mutated: &str,
		#[case] expected: Vec<usize>,
	) {
		assert_eq!(select_affected(&paths(bound), &Path::new(mutated)), expected);
	}

	#[test]
	fn test_exact_binding_not_suppressed_by_deeper_one() {
		let bound = paths(&["a.b", "a.b.c"]);
		assert_eq!(select_affected(&bound, &Path::new("a.b")), vec![0, 1]);
	}

	#[test]
	fn test_registry_keys_are_stable() {
		let mut registry = Registry::new();
		let keys = registry.extend(vec![binding("a", 1), binding("b", 2)]);
		registry.retain(|r| r.element != 1);

		assert_eq!(registry.len(), 1);
		assert_eq!(registry.get(keys[1]).map(|r| r.element), Some(2));
		assert!(registry.get(keys[0]).is_none());
	}

	#[test]
	fn test_insert_after_keeps_parent_first_order() {
		let mut registry = Registry::new();
		let keys = registry.extend(vec![binding("a", 1), binding("b", 2)]);
		registry.insert_after(keys[0], vec![binding("a.x", 3)]);

		let order: Vec<u32> = registry.iter().map(|r| r.element).collect();
		assert_eq!(order, vec![1, 3, 2]);
	}

	#[test]
	fn test_affected_preserves_registry_order() {
		let mut registry = Registry::new();
		let keys = registry.extend(vec![binding("a.y", 1), binding("b", 2), binding("a.x", 3)]);

		assert_eq!(registry.affected(&Path::new("a")), vec![keys[0], keys[2]]);
	}
}
