//! Error types for store mutation, binding notification and module resolution.

use thiserror::Error;

/// Result alias used throughout bindery-pages.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the data store, the binding resolver and the template layer.
#[derive(Debug, Error)]
pub enum Error {
	/// `push` targeted a value that is not a sequence.
	///
	/// The store is left unmodified and no notification fires.
	#[error("cannot push to `{path}`: expected a sequence, found {found}")]
	TypeKind {
		/// The path that was pushed to.
		path: String,
		/// Kind of the value found at the path (`mapping`, `string`, `absent`, ...).
		found: &'static str,
	},

	/// `set` indexed an existing sequence more than one past its end.
	///
	/// The store is left unmodified and no notification fires.
	#[error("cannot set `{path}`: index {index} is out of range for a sequence of length {len}")]
	IndexOutOfRange {
		/// The path that was set.
		path: String,
		/// The offending segment.
		index: String,
		/// Length of the sequence.
		len: usize,
	},

	/// A binding re-triggered itself within the same notification chain.
	#[error("binding `{path}` re-triggered itself at notification depth {depth}")]
	CyclicBinding {
		/// Path of the registration that cycled.
		path: String,
		/// Nesting depth of the notification chain when the cycle was detected.
		depth: usize,
	},

	/// A `{data, path}` pipe descriptor could not be re-imported.
	#[error("cannot resolve export `{export}` from module `{path}`: {reason}")]
	Resolution {
		/// Module path declared by the pipe descriptor.
		path: String,
		/// Export name (the pipe entry name).
		export: String,
		/// Why resolution failed.
		reason: String,
	},

	/// No template module is registered under this name.
	#[error("template `{0}` is not registered")]
	UnknownTemplate(String),

	/// The template module has no layout with this name.
	#[error("template `{template}` has no layout `{layout}`")]
	UnknownLayout {
		/// Template module path.
		template: String,
		/// Requested layout name.
		layout: String,
	},

	/// Configuration could not be read or parsed.
	#[error("invalid configuration: {0}")]
	Config(String),

	/// SSR state could not be encoded or decoded.
	#[error("SSR state encoding failed: {0}")]
	State(#[from] serde_json::Error),
}

impl Error {
	/// Returns `true` for errors that abort a notification chain.
	pub fn is_fatal(&self) -> bool {
		matches!(self, Self::CyclicBinding { .. })
	}
}

/// Describes the JSON kind of an optional value for error messages.
pub(crate) fn kind_of(value: Option<&serde_json::Value>) -> &'static str {
	use serde_json::Value;

	match value {
		None => "absent",
		Some(Value::Null) => "null",
		Some(Value::Bool(_)) => "boolean",
		Some(Value::Number(_)) => "number",
		Some(Value::String(_)) => "string",
		Some(Value::Array(_)) => "sequence",
		Some(Value::Object(_)) => "mapping",
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case(None, "absent")]
	#[case(Some(json!(null)), "null")]
	#[case(Some(json!("x")), "string")]
	#[case(Some(json!([1])), "sequence")]
	#[case(Some(json!({"a": 1})), "mapping")]
	fn test_kind_of(#[case] value: Option<serde_json::Value>, #[case] expected: &str) {
		assert_eq!(kind_of(value.as_ref()), expected);
	}

	#[test]
	fn test_type_kind_display() {
		let err = Error::TypeKind {
			path: "user.name".to_string(),
			found: "string",
		};
		assert_eq!(
			err.to_string(),
			"cannot push to `user.name`: expected a sequence, found string"
		);
		assert!(!err.is_fatal());
	}

	#[test]
	fn test_index_out_of_range_display() {
		let err = Error::IndexOutOfRange {
			path: "items.9".to_string(),
			index: "9".to_string(),
			len: 2,
		};
		assert_eq!(
			err.to_string(),
			"cannot set `items.9`: index 9 is out of range for a sequence of length 2"
		);
		assert!(!err.is_fatal());
	}

	#[test]
	fn test_cyclic_is_fatal() {
		let err = Error::CyclicBinding {
			path: "a".to_string(),
			depth: 2,
		};
		assert!(err.is_fatal());
	}
}
