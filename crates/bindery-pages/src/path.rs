//! Dot-delimited paths into the data store.
//!
//! A path such as `user.friends.0.name` addresses nested mappings and
//! sequences. Numeric segments index into sequences. The empty path
//! addresses the store root. There is no escaping mechanism for literal
//! dots inside keys.

use std::fmt;

/// A dot-separated path into the data store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(String);

impl Path {
	/// Creates a path from its dotted form.
	pub fn new(path: impl Into<String>) -> Self {
		Self(path.into())
	}

	/// The root path (`""`).
	pub fn root() -> Self {
		Self(String::new())
	}

	/// Returns the dotted form.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Returns `true` for the root path.
	pub fn is_root(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates over the path segments. The root path has none.
	pub fn segments(&self) -> impl Iterator<Item = &str> {
		let raw = self.0.as_str();
		raw.split('.').filter(move |_| !raw.is_empty())
	}

	/// Number of segments.
	pub fn depth(&self) -> usize {
		self.segments().count()
	}

	/// Returns the parent path, or `None` for the root.
	pub fn parent(&self) -> Option<Path> {
		if self.is_root() {
			return None;
		}
		match self.0.rfind('.') {
			Some(idx) => Some(Self(self.0[..idx].to_string())),
			None => Some(Self::root()),
		}
	}

	/// Returns the last segment, or `None` for the root.
	pub fn last(&self) -> Option<&str> {
		self.segments().last()
	}

	/// Appends a segment.
	pub fn join(&self, segment: &str) -> Path {
		if self.is_root() {
			Self(segment.to_string())
		} else {
			Self(format!("{}.{}", self.0, segment))
		}
	}

	/// `true` if `self` equals `other` or is one of its prefixes.
	pub fn is_ancestor_or_equal(&self, other: &Path) -> bool {
		if self.is_root() || self.0 == other.0 {
			return true;
		}
		other.0.len() > self.0.len()
			&& other.0.starts_with(&self.0)
			&& other.0.as_bytes()[self.0.len()] == b'.'
	}

	/// `true` if `self` is a prefix of `other` with fewer segments.
	pub fn is_strict_ancestor(&self, other: &Path) -> bool {
		self.0 != other.0 && self.is_ancestor_or_equal(other)
	}

	/// `true` if one path contains the other.
	pub fn is_related(&self, other: &Path) -> bool {
		self.is_ancestor_or_equal(other) || other.is_ancestor_or_equal(self)
	}

	/// Strict prefixes from the root down to the parent.
	pub fn ancestors(&self) -> Vec<Path> {
		let mut out = Vec::new();
		let mut current = self.parent();
		while let Some(path) = current {
			current = path.parent();
			out.push(path);
		}
		out.reverse();
		out
	}
}

impl fmt::Display for Path {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for Path {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

impl From<String> for Path {
	fn from(value: String) -> Self {
		Self(value)
	}
}

impl From<&Path> for Path {
	fn from(value: &Path) -> Self {
		value.clone()
	}
}

impl AsRef<str> for Path {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
