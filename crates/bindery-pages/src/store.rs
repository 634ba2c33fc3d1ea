//! Path-addressable data store
//!
//! The store is a single root mapping of JSON values. Bound elements read
//! from it by [`Path`], and every successful mutation synchronously notifies
//! the attached [`Subscriber`] (the binding resolver on the client) before the
//! mutating call returns.
//!
//! On the client there is one store per page, owned by the [`Client`](crate::client::Client).
//! On the server a fresh store is built for every render call, so nothing
//! leaks between requests.
//!
//! ## Example
//!
//! ```
//! use bindery_pages::store::Store;
//! use serde_json::json;
//!
//! let store = Store::new();
//! store.set("test", json!({"class": "x", "children": ["one", "two"]})).unwrap();
//! store.push("test.children", json!("three")).unwrap();
//!
//! assert_eq!(store.get("test.children.2"), Some(json!("three")));
//! assert_eq!(store.get("test.missing.deep"), None);
//! ```

use crate::error::{Error, Result, kind_of};
use crate::path::Path;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Receives change notifications from a [`Store`].
pub trait Subscriber {
	/// Called once per successful mutation with the mutated path.
	///
	/// The store is not borrowed while this runs, so implementations may read
	/// from it and may mutate it re-entrantly.
	fn notify(&self, store: &Store, path: &Path) -> Result<()>;
}

struct StoreInner {
	root: RefCell<Value>,
	subscriber: RefCell<Option<Weak<dyn Subscriber>>>,
}

/// Shared handle to a data store.
///
/// Cloning the handle does not copy the data.
#[derive(Clone)]
pub struct Store {
	inner: Rc<StoreInner>,
}

impl Default for Store {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for Store {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Store")
			.field("root", &*self.inner.root.borrow())
			.field("subscribed", &self.inner.subscriber.borrow().is_some())
			.finish()
	}
}

impl Store {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self::with_data(Value::Object(Map::new()))
	}

	/// Creates a store seeded with `data`.
	pub fn with_data(data: Value) -> Self {
		Self {
			inner: Rc::new(StoreInner {
				root: RefCell::new(data),
				subscriber: RefCell::new(None),
			}),
		}
	}

	/// Attaches the subscriber that receives change notifications.
	pub fn subscribe(&self, subscriber: Weak<dyn Subscriber>) {
		*self.inner.subscriber.borrow_mut() = Some(subscriber);
	}

	/// Detaches the current subscriber, if any.
	pub fn unsubscribe(&self) {
		self.inner.subscriber.borrow_mut().take();
	}

	/// Returns a copy of the value at `path`, or `None` if any segment is absent.
	pub fn get(&self, path: impl Into<Path>) -> Option<Value> {
		let path = path.into();
		lookup(&self.inner.root.borrow(), &path).cloned()
	}

	/// Runs `f` against the value at `path` without cloning it.
	///
	/// `f` must not mutate the store.
	pub fn with<R>(&self, path: impl Into<Path>, f: impl FnOnce(Option<&Value>) -> R) -> R {
		let path = path.into();
		let root = self.inner.root.borrow();
		f(lookup(&root, &path))
	}

	/// `true` if `path` currently resolves.
	pub fn contains(&self, path: impl Into<Path>) -> bool {
		self.with(path, |value| value.is_some())
	}

	/// `true` if every strict prefix of `path` resolves to a mapping or sequence.
	pub fn is_bindable(&self, path: &Path) -> bool {
		let root = self.inner.root.borrow();
		path.ancestors().iter().all(|prefix| {
			matches!(
				lookup(&root, prefix),
				Some(Value::Object(_)) | Some(Value::Array(_))
			)
		})
	}

	/// Returns a copy of the whole store.
	pub fn snapshot(&self) -> Value {
		self.inner.root.borrow().clone()
	}

	/// Replaces the value at `path`, creating intermediate mappings as needed,
	/// then notifies the subscriber.
	///
	/// A numeric segment into an existing sequence may address an element or
	/// the position one past the end (an append). Anything further fails with
	/// [`Error::IndexOutOfRange`] and leaves the store untouched.
	///
	/// Setting `null` stores `null` and bound elements see `Some(null)`; use
	/// [`Store::remove`] to unset a path.
	pub fn set(&self, path: impl Into<Path>, value: Value) -> Result<()> {
		let path = path.into();
		{
			let mut root = self.inner.root.borrow_mut();
			check_indices(&root, &path)?;
			*slot_mut(&mut root, &path) = value;
		}
		self.notify(&path)
	}

	/// Appends `value` to the sequence at `path`, then notifies the subscriber.
	///
	/// Fails with [`Error::TypeKind`] when the value at `path` is not a
	/// sequence; the store is left untouched and nothing is notified.
	pub fn push(&self, path: impl Into<Path>, value: Value) -> Result<()> {
		let path = path.into();
		{
			let mut root = self.inner.root.borrow_mut();
			match lookup_mut(&mut root, &path) {
				Some(Value::Array(items)) => items.push(value),
				other => {
					return Err(Error::TypeKind {
						path: path.to_string(),
						found: kind_of(other.as_deref()),
					});
				}
			}
		}
		self.notify(&path)
	}

	/// Removes the value at `path` and notifies the subscriber.
	///
	/// Returns the removed value. Removing an absent path is a no-op and
	/// notifies nothing. Removing the root resets the store to an empty mapping.
	pub fn remove(&self, path: impl Into<Path>) -> Result<Option<Value>> {
		let path = path.into();
		let removed = {
			let mut root = self.inner.root.borrow_mut();
			remove_at(&mut root, &path)
		};
		if removed.is_some() {
			self.notify(&path)?;
		}
		Ok(removed)
	}

	/// Read-modify-write of the value at `path`; notifies once.
	pub fn update(
		&self,
		path: impl Into<Path>,
		f: impl FnOnce(Option<&Value>) -> Value,
	) -> Result<()> {
		let path = path.into();
		let next = self.with(&path, f);
		self.set(path, next)
	}

	/// Replaces the whole store without notifying. Used to restore SSR state.
	pub(crate) fn replace_root(&self, data: Value) {
		*self.inner.root.borrow_mut() = data;
	}

	/// Merges a seed into the root without notifying.
	///
	/// Top-level keys of a mapping seed overwrite existing keys; any other
	/// seed replaces the root.
	pub(crate) fn seed(&self, data: Value) {
		let mut root = self.inner.root.borrow_mut();
		match (&mut *root, data) {
			(Value::Object(existing), Value::Object(incoming)) => existing.extend(incoming),
			(root, data) => *root = data,
		}
	}

	fn notify(&self, path: &Path) -> Result<()> {
		let subscriber = self
			.inner
			.subscriber
			.borrow()
			.as_ref()
			.and_then(Weak::upgrade);
		match subscriber {
			Some(subscriber) => subscriber.notify(self, path),
			None => Ok(()),
		}
	}
}

fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
	match value {
		Value::Object(map) => map.get(segment),
		Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
		_ => None,
	}
}

fn child_mut<'a>(value: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
	match value {
		Value::Object(map) => map.get_mut(segment),
		Value::Array(items) => segment
			.parse::<usize>()
			.ok()
			.and_then(move |i| items.get_mut(i)),
		_ => None,
	}
}

/// Walks `path` from `root`; `None` as soon as a segment is absent.
pub(crate) fn lookup<'a>(root: &'a Value, path: &Path) -> Option<&'a Value> {
	path.segments()
		.try_fold(root, |current, segment| child(current, segment))
}

fn lookup_mut<'a>(root: &'a mut Value, path: &Path) -> Option<&'a mut Value> {
	path.segments()
		.try_fold(root, |current, segment| child_mut(current, segment))
}

/// Fails if `path` indexes an existing sequence past its end.
///
/// Only the existing part of the tree is walked; containers created by
/// [`slot_mut`] are always empty, so no later segment can hit a sequence.
fn check_indices(root: &Value, path: &Path) -> Result<()> {
	let mut current = Some(root);
	for segment in path.segments() {
		let Some(value) = current else {
			return Ok(());
		};
		if let Value::Array(items) = value
			&& is_index(segment)
			&& !segment.parse::<usize>().is_ok_and(|index| index <= items.len())
		{
			return Err(Error::IndexOutOfRange {
				path: path.to_string(),
				index: segment.to_string(),
				len: items.len(),
			});
		}
		current = child(value, segment);
	}
	Ok(())
}

fn is_index(segment: &str) -> bool {
	!segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Returns the slot for `path`, creating every missing container on the way.
///
/// A numeric segment one past the end of a sequence appends `null`; any other
/// segment turns a non-mapping into an empty mapping. Callers run
/// [`check_indices`] first.
fn slot_mut<'a>(root: &'a mut Value, path: &Path) -> &'a mut Value {
	let mut current = root;
	for segment in path.segments() {
		current = ensure_child(current, segment);
	}
	current
}

fn ensure_child<'a>(value: &'a mut Value, segment: &str) -> &'a mut Value {
	let array_index = match (&*value, segment.parse::<usize>().ok()) {
		(Value::Array(items), Some(index)) if index <= items.len() => Some(index),
		_ => None,
	};
	match (value, array_index) {
		(Value::Array(items), Some(index)) => {
			if index == items.len() {
				items.push(Value::Null);
			}
			&mut items[index]
		}
		(value, _) => {
			if !value.is_object() {
				*value = Value::Object(Map::new());
			}
			// Indexing a mapping inserts `null` for a missing key.
			&mut value[segment]
		}
	}
}

fn remove_at(root: &mut Value, path: &Path) -> Option<Value> {
	let Some(parent) = path.parent() else {
		let previous = std::mem::replace(root, Value::Object(Map::new()));
		return Some(previous);
	};
	let segment = path.last()?;
	match lookup_mut(root, &parent)? {
		Value::Object(map) => map.remove(segment),
		Value::Array(items) => {
			let index = segment.parse::<usize>().ok()?;
			(index < items.len()).then(|| items.remove(index))
		}
		_ => None,
	}
}
