//! Node descriptions consumed by the render engine.
//!
//! A [`Node`] describes one element before rendering: tag, ordered
//! properties, an optional `if` condition, an optional binding path and an
//! optional pipe. Nodes are cheap to clone and immutable once shared; the
//! builder methods copy-on-write.

use crate::builder::html::Elements;
use crate::path::Path;
use crate::pipe::{Pipe, PipeContext};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// A binding function: `(bound value, element namespace, pipe context) -> property value`.
///
/// The bound value is `None` when the path does not resolve; binding functions
/// must tolerate that.
pub type BindingFn =
	Arc<dyn Fn(Option<&Value>, &Elements, &PipeContext) -> PropValue + Send + Sync + 'static>;

/// A child of a node.
#[derive(Debug, Clone)]
pub enum Content {
	/// An element child.
	Element(Node),
	/// A text child.
	Text(String),
}

impl From<Node> for Content {
	fn from(node: Node) -> Self {
		Self::Element(node)
	}
}

impl From<&str> for Content {
	fn from(text: &str) -> Self {
		Self::Text(text.to_string())
	}
}

impl From<String> for Content {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}

impl From<&String> for Content {
	fn from(text: &String) -> Self {
		Self::Text(text.clone())
	}
}

impl From<&Value> for Content {
	fn from(value: &Value) -> Self {
		Self::Text(value_to_text(value))
	}
}

impl From<Value> for Content {
	fn from(value: Value) -> Self {
		Self::from(&value)
	}
}

/// A resolved property value.
#[derive(Debug, Clone)]
pub enum PropValue {
	/// A string attribute value or text.
	Str(String),
	/// A boolean attribute: present when `true`, omitted when `false`.
	Bool(bool),
	/// Any JSON value; strings and booleans behave like `Str` and `Bool`.
	Json(Value),
	/// A single child.
	Child(Box<Content>),
	/// An ordered list of children.
	Children(Vec<Content>),
	/// Omit the property.
	Absent,
}

impl PropValue {
	/// Builds a children value from anything iterable.
	pub fn children<I, C>(children: I) -> Self
	where
		I: IntoIterator<Item = C>,
		C: Into<Content>,
	{
		Self::Children(children.into_iter().map(Into::into).collect())
	}

	/// Builds a single-child value.
	pub fn child(child: impl Into<Content>) -> Self {
		Self::Child(Box::new(child.into()))
	}

	/// Converts the value into children, in order.
	pub fn into_contents(self) -> Vec<Content> {
		match self {
			Self::Str(text) => vec![Content::Text(text)],
			Self::Bool(_) | Self::Absent | Self::Json(Value::Null) => Vec::new(),
			Self::Json(Value::Array(items)) => items.iter().map(Content::from).collect(),
			Self::Json(value) => vec![Content::from(&value)],
			Self::Child(child) => vec![*child],
			Self::Children(children) => children,
		}
	}
}

impl From<&str> for PropValue {
	fn from(value: &str) -> Self {
		Self::Str(value.to_string())
	}
}

impl From<String> for PropValue {
	fn from(value: String) -> Self {
		Self::Str(value)
	}
}

impl From<bool> for PropValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<Value> for PropValue {
	fn from(value: Value) -> Self {
		Self::Json(value)
	}
}

impl From<Node> for PropValue {
	fn from(node: Node) -> Self {
		Self::child(node)
	}
}

impl From<Vec<Content>> for PropValue {
	fn from(children: Vec<Content>) -> Self {
		Self::Children(children)
	}
}

impl From<Vec<Node>> for PropValue {
	fn from(children: Vec<Node>) -> Self {
		Self::children(children)
	}
}

/// A declared property: a static value or a binding function.
#[derive(Clone)]
pub enum Prop {
	/// Used as-is.
	Static(PropValue),
	/// Evaluated against the bound value; only honoured on bound nodes.
	Bound(BindingFn),
}

impl fmt::Debug for Prop {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Static(value) => f.debug_tuple("Static").field(value).finish(),
			Self::Bound(_) => f.write_str("Bound(..)"),
		}
	}
}

/// Raw shorthand passed to an element constructor.
///
/// The element catalog turns it into canonical properties per tag.
#[derive(Debug, Clone, Default)]
pub enum Shorthand {
	/// No shorthand.
	#[default]
	None,
	/// A string (text, `href`, `src`, ... depending on the tag).
	Text(String),
	/// A list of children.
	List(Vec<Content>),
	/// A property mapping.
	Map(Map<String, Value>),
}

impl From<()> for Shorthand {
	fn from(_: ()) -> Self {
		Self::None
	}
}

impl From<&str> for Shorthand {
	fn from(value: &str) -> Self {
		Self::Text(value.to_string())
	}
}

impl From<String> for Shorthand {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}

impl From<&String> for Shorthand {
	fn from(value: &String) -> Self {
		Self::Text(value.clone())
	}
}

impl From<Vec<Content>> for Shorthand {
	fn from(value: Vec<Content>) -> Self {
		Self::List(value)
	}
}

impl From<Vec<Node>> for Shorthand {
	fn from(value: Vec<Node>) -> Self {
		Self::List(value.into_iter().map(Content::Element).collect())
	}
}

impl From<Node> for Shorthand {
	fn from(value: Node) -> Self {
		Self::List(vec![Content::Element(value)])
	}
}

impl From<&Value> for Shorthand {
	fn from(value: &Value) -> Self {
		match value {
			Value::Null => Self::None,
			Value::String(text) => Self::Text(text.clone()),
			Value::Array(items) => Self::List(items.iter().map(Content::from).collect()),
			Value::Object(map) => Self::Map(map.clone()),
			other => Self::Text(other.to_string()),
		}
	}
}

impl From<Value> for Shorthand {
	fn from(value: Value) -> Self {
		Self::from(&value)
	}
}

#[derive(Debug, Clone)]
struct NodeData {
	tag: Cow<'static, str>,
	shorthand: Shorthand,
	props: Vec<(Cow<'static, str>, Prop)>,
	condition: Option<bool>,
	binding: Option<Path>,
	pipe: Option<Pipe>,
}

/// Immutable description of one element.
#[derive(Debug, Clone)]
pub struct Node {
	data: Arc<NodeData>,
}

impl Node {
	/// Creates a node for `tag` with no properties.
	pub fn new(tag: impl Into<Cow<'static, str>>) -> Self {
		Self {
			data: Arc::new(NodeData {
				tag: tag.into(),
				shorthand: Shorthand::None,
				props: Vec::new(),
				condition: None,
				binding: None,
				pipe: None,
			}),
		}
	}

	fn data_mut(&mut self) -> &mut NodeData {
		Arc::make_mut(&mut self.data)
	}

	/// Sets the raw shorthand.
	///
	/// A mapping shorthand may carry the node-level keys `if`, `binding` and
	/// `pipe`; they are applied as [`Node::when`], [`Node::bind`] and
	/// [`Node::pipe`] and never reach the element's properties.
	pub fn shorthand(mut self, shorthand: impl Into<Shorthand>) -> Self {
		let mut shorthand = shorthand.into();
		if let Shorthand::Map(map) = &mut shorthand {
			if let Some(condition) = map.remove("if") {
				self = self.when(is_truthy(&condition));
			}
			match map.remove("binding") {
				Some(Value::String(path)) => self = self.bind(path),
				Some(other) => tracing::warn!(binding = %other, "ignoring non-string binding"),
				None => {}
			}
			if let Some(pipe) = map.remove("pipe") {
				self = self.pipe(pipe_from_json(pipe));
			}
		}
		self.data_mut().shorthand = shorthand;
		self
	}

	/// Sets a property; a later property with the same name replaces the earlier one.
	pub fn prop(mut self, name: impl Into<Cow<'static, str>>, prop: Prop) -> Self {
		let name = name.into();
		let props = &mut self.data_mut().props;
		match props.iter_mut().find(|(n, _)| *n == name) {
			Some(slot) => slot.1 = prop,
			None => props.push((name, prop)),
		}
		self
	}

	/// Sets a static attribute.
	pub fn attr(self, name: impl Into<Cow<'static, str>>, value: impl Into<PropValue>) -> Self {
		self.prop(name, Prop::Static(value.into()))
	}

	/// Sets a binding function for `name`.
	pub fn bound<F>(self, name: impl Into<Cow<'static, str>>, f: F) -> Self
	where
		F: Fn(Option<&Value>, &Elements, &PipeContext) -> PropValue + Send + Sync + 'static,
	{
		self.prop(name, Prop::Bound(Arc::new(f)))
	}

	/// Sets the `class` attribute.
	pub fn class(self, class: impl Into<String>) -> Self {
		self.attr("class", PropValue::Str(class.into()))
	}

	/// Sets the `id` attribute.
	pub fn id(self, id: impl Into<String>) -> Self {
		self.attr("id", PropValue::Str(id.into()))
	}

	/// Sets the text content.
	pub fn text(self, text: impl Into<String>) -> Self {
		self.attr("text", PropValue::Str(text.into()))
	}

	/// Appends one static child.
	pub fn child(mut self, child: impl Into<Content>) -> Self {
		let child = child.into();
		let data = self.data_mut();
		match data.props.iter_mut().find(|(n, _)| n == "children") {
			Some((_, Prop::Static(PropValue::Children(children)))) => children.push(child),
			Some(slot) => slot.1 = Prop::Static(PropValue::Children(vec![child])),
			None => data
				.props
				.push((Cow::Borrowed("children"), Prop::Static(PropValue::Children(vec![child])))),
		}
		self
	}

	/// Appends static children.
	pub fn children<I, C>(self, children: I) -> Self
	where
		I: IntoIterator<Item = C>,
		C: Into<Content>,
	{
		children.into_iter().fold(self, |node, child| node.child(child))
	}

	/// Sets the `if` condition. A `false` condition renders nothing.
	pub fn when(mut self, condition: bool) -> Self {
		self.data_mut().condition = Some(condition);
		self
	}

	/// Binds the node to a store path.
	pub fn bind(mut self, path: impl Into<Path>) -> Self {
		self.data_mut().binding = Some(path.into());
		self
	}

	/// Declares the node's pipe.
	pub fn pipe(mut self, pipe: Pipe) -> Self {
		self.data_mut().pipe = Some(pipe);
		self
	}

	/// Tag name.
	pub fn tag(&self) -> &str {
		&self.data.tag
	}

	/// Raw shorthand.
	pub fn raw_shorthand(&self) -> &Shorthand {
		&self.data.shorthand
	}

	/// Declared properties in order.
	pub fn props(&self) -> &[(Cow<'static, str>, Prop)] {
		&self.data.props
	}

	/// The `if` condition, if declared.
	pub fn condition(&self) -> Option<bool> {
		self.data.condition
	}

	/// The binding path, if declared.
	pub fn binding(&self) -> Option<&Path> {
		self.data.binding.as_ref()
	}

	/// The declared pipe.
	pub fn declared_pipe(&self) -> Option<&Pipe> {
		self.data.pipe.as_ref()
	}

	/// `true` if both handles share the same description.
	pub fn ptr_eq(&self, other: &Node) -> bool {
		Arc::ptr_eq(&self.data, &other.data)
	}
}

/// Shorthand keys that configure the node rather than its element.
pub(crate) const NODE_KEYS: [&str; 3] = ["if", "binding", "pipe"];

/// Truthiness of an `if` value: `false`, `null`, `0` and `""` are false.
pub(crate) fn is_truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(flag) => *flag,
		Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
		Value::String(text) => !text.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	}
}

/// Builds a pipe from its JSON form.
///
/// Each key names an entry. A `{data, path}` object with a string `path` is a
/// module descriptor; anything else is a literal value.
fn pipe_from_json(value: Value) -> Pipe {
	let Value::Object(entries) = value else {
		tracing::warn!(pipe = %value, "ignoring non-mapping pipe");
		return Pipe::new();
	};
	entries.into_iter().fold(Pipe::new(), |pipe, (name, entry)| match entry {
		Value::Object(mut descriptor)
			if descriptor.len() == 2
				&& descriptor.contains_key("data")
				&& descriptor.get("path").is_some_and(Value::is_string) =>
		{
			let path = match descriptor.remove("path") {
				Some(Value::String(path)) => path,
				_ => String::new(),
			};
			let data = descriptor.remove("data").unwrap_or(Value::Null);
			pipe.module(name, path, data)
		}
		other => pipe.value(name, other),
	})
}

/// Text form of a JSON value: strings unquoted, `null` empty.
pub(crate) fn value_to_text(value: &Value) -> String {
	match value {
		Value::Null => String::new(),
		Value::String(text) => text.clone(),
		other => other.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[test]
	fn test_prop_replaces_in_place() {
		let node = Node::new("div")
			.attr("id", "a")
			.attr("class", "x")
			.attr("id", "b");

		let names: Vec<&str> = node.props().iter().map(|(n, _)| n.as_ref()).collect();

		assert_eq!(names, vec!["id", "class"]);
		assert!(matches!(&node.props()[0].1, Prop::Static(PropValue::Str(s)) if s == "b"));
	}

	#[test]
	fn test_child_accumulates() {
		let node = Node::new("ul").child("a").child(Node::new("li"));
		match &node.props()[0].1 {
			Prop::Static(PropValue::Children(children)) => assert_eq!(children.len(), 2),
			other => panic!("unexpected {:?}", other),
		}
	}

	#[test]
	fn test_builder_copy_on_write() {
		let base = Node::new("p");
		let shared = base.clone();
		let changed = base.class("x");
		assert!(shared.props().is_empty());
		assert_eq!(changed.props().len(), 1);
	}

	#[test]
	fn test_shorthand_from_json() {
		assert!(matches!(Shorthand::from(json!("t")), Shorthand::Text(t) if t == "t"));
		assert!(matches!(Shorthand::from(json!([1, "b"])), Shorthand::List(l) if l.len() == 2));
		assert!(matches!(Shorthand::from(json!({"a": 1})), Shorthand::Map(_)));
		assert!(matches!(Shorthand::from(json!(null)), Shorthand::None));
		assert!(matches!(Shorthand::from(json!(3)), Shorthand::Text(t) if t == "3"));
	}

	#[test]
	fn test_into_contents() {
		let contents = PropValue::Json(json!(["one", 2])).into_contents();
		let texts: Vec<String> = contents
			.into_iter()
			.map(|c| match c {
				Content::Text(t) => t,
				Content::Element(_) => String::new(),
			})
			.collect();
		assert_eq!(texts, vec!["one", "2"]);
		assert!(PropValue::Bool(true).into_contents().is_empty());
	}

	#[test]
	fn test_map_shorthand_node_keys() {
		let node = Node::new("span").shorthand(json!({
			"if": true,
			"binding": "user",
			"pipe": {"greeting": {"data": "Hi", "path": "/helpers"}, "limit": 3},
			"class": "x",
		}));

		assert_eq!(node.condition(), Some(true));
		assert_eq!(node.binding().map(Path::as_str), Some("user"));
		let pipe = node.declared_pipe().unwrap();
		assert_eq!(pipe.entries().len(), 2);
		assert_eq!(pipe.module_paths().get("greeting").map(String::as_str), Some("/helpers"));
		match node.raw_shorthand() {
			Shorthand::Map(map) => assert_eq!(map.keys().collect::<Vec<_>>(), vec!["class"]),
			other => panic!("unexpected {:?}", other),
		}
	}

	#[rstest]
	#[case(json!(false), false)]
	#[case(json!(null), false)]
	#[case(json!(0), false)]
	#[case(json!(""), false)]
	#[case(json!(true), true)]
	#[case(json!(1), true)]
	#[case(json!("no"), true)]
	#[case(json!([]), true)]
	fn test_if_truthiness(#[case] value: Value, #[case] expected: bool) {
		let node = Node::new("div").shorthand(json!({"if": value}));
		assert_eq!(node.condition(), Some(expected));
	}

	#[test]
	fn test_binding_and_condition() {
		let node = Node::new("span").bind("user.name").when(false);
		assert_eq!(node.binding().map(Path::as_str), Some("user.name"));
		assert_eq!(node.condition(), Some(false));
	}
}
