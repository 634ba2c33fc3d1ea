//! SSR state serialization for hydration.
//!
//! The request store snapshot and the binding metadata of a server render
//! travel to the client in a JSON `<script>` element, from which
//! [`SsrState::extract`] restores them.

use crate::binding::NewBinding;
use crate::error::Result;
use crate::html::escape_json_for_script;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The `id` of the state `<script>` element.
pub const STATE_SCRIPT_ID: &str = "bd-state";

/// One bound element recorded by a server render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingRecord {
	/// Marker id.
	pub id: String,
	/// Bound path.
	pub path: String,
	/// Pipe export name -> module path.
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub pipe: BTreeMap<String, String>,
}

impl<H> From<&NewBinding<H>> for BindingRecord {
	fn from(binding: &NewBinding<H>) -> Self {
		Self {
			id: binding.id.clone(),
			path: binding.path.to_string(),
			pipe: binding
				.node
				.declared_pipe()
				.map(|pipe| pipe.module_paths())
				.unwrap_or_default(),
		}
	}
}

/// Represents the serialized SSR state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsrState {
	/// Store snapshot after the render.
	data: Value,
	/// Bound elements in render order.
	bindings: Vec<BindingRecord>,
	/// Additional metadata.
	metadata: BTreeMap<String, Value>,
}

impl SsrState {
	/// Creates a new empty SSR state.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a state around a store snapshot.
	pub fn with_data(data: Value) -> Self {
		Self {
			data,
			..Self::default()
		}
	}

	/// The store snapshot.
	pub fn data(&self) -> &Value {
		&self.data
	}

	/// Replaces the store snapshot.
	pub fn set_data(&mut self, data: Value) {
		self.data = data;
	}

	/// Records a bound element.
	pub fn add_binding(&mut self, record: BindingRecord) {
		self.bindings.push(record);
	}

	/// Bound elements in render order.
	pub fn bindings(&self) -> &[BindingRecord] {
		&self.bindings
	}

	/// Looks up a bound element by marker id.
	pub fn binding(&self, id: &str) -> Option<&BindingRecord> {
		self.bindings.iter().find(|record| record.id == id)
	}

	/// Adds metadata to the state.
	pub fn add_metadata(&mut self, key: impl Into<String>, value: impl Serialize) {
		if let Ok(json) = serde_json::to_value(value) {
			self.metadata.insert(key.into(), json);
		}
	}

	/// Gets metadata by key.
	pub fn get_metadata(&self, key: &str) -> Option<&Value> {
		self.metadata.get(key)
	}

	/// Checks if the state is empty.
	pub fn is_empty(&self) -> bool {
		let no_data = match &self.data {
			Value::Null => true,
			Value::Object(map) => map.is_empty(),
			_ => false,
		};
		no_data && self.bindings.is_empty() && self.metadata.is_empty()
	}

	/// Serializes the state to JSON.
	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string(self)?)
	}

	/// Serializes the state to pretty-printed JSON.
	pub fn to_json_pretty(&self) -> Result<String> {
		Ok(serde_json::to_string_pretty(self)?)
	}

	/// Deserializes state from JSON.
	pub fn from_json(json: &str) -> Result<Self> {
		Ok(serde_json::from_str(json)?)
	}

	/// Generates the `<script>` element carrying the serialized state.
	pub fn to_script_tag(&self) -> String {
		let json = self.to_json().unwrap_or_else(|_| "{}".to_string());
		format!(
			r#"<script id="{}" type="application/json">{}</script>"#,
			STATE_SCRIPT_ID,
			escape_json_for_script(&json)
		)
	}

	/// Finds and decodes the state `<script>` element in a page.
	///
	/// Returns `Ok(None)` when the page carries no state.
	pub fn extract(page: &str) -> Result<Option<Self>> {
		let opening = format!(r#"<script id="{}" type="application/json">"#, STATE_SCRIPT_ID);
		let Some(start) = page.find(&opening).map(|at| at + opening.len()) else {
			return Ok(None);
		};
		let Some(len) = page[start..].find("</script>") else {
			return Ok(None);
		};
		Self::from_json(&page[start..start + len]).map(Some)
	}

	/// Merges another state into this one.
	///
	/// Top-level data keys of `other` win; bindings are appended.
	pub fn merge(&mut self, other: SsrState) {
		match (&mut self.data, other.data) {
			(Value::Object(mine), Value::Object(theirs)) => mine.extend(theirs),
			(_, Value::Null) => {}
			(mine, theirs) => *mine = theirs,
		}
		self.bindings.extend(other.bindings);
		self.metadata.extend(other.metadata);
	}
}
