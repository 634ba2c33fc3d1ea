//! In-memory document used by the client renderer
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Freed slots are
//! reused, but every reuse bumps the slot's generation, so a stale id held by
//! a binding registration is still recognised by [`Document::contains`].
//!
//! Properties are assigned by DOM property name (`className`, `htmlFor`) and
//! reflected to their attributes, which is what [`Document::outer_html`]
//! serializes.

use crate::builder::html::{Namespace, element};
use crate::html::{self, AttrValue};
use std::fmt;

/// Handle to a node in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
	index: usize,
	generation: u32,
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.generation {
			0 => write!(f, "#{}", self.index),
			generation => write!(f, "#{}v{}", self.index, generation),
		}
	}
}

#[derive(Debug, Clone)]
enum NodeKind {
	Element {
		tag: String,
		namespace: Namespace,
		is_void: bool,
		attrs: Vec<(String, AttrValue)>,
	},
	Text(String),
}

#[derive(Debug, Clone)]
struct DomNode {
	kind: NodeKind,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Slot {
	generation: u32,
	node: Option<DomNode>,
}

/// An arena of element and text nodes with a `<body>` root.
#[derive(Debug, Clone)]
pub struct Document {
	slots: Vec<Slot>,
	free: Vec<usize>,
	body: NodeId,
}

impl Default for Document {
	fn default() -> Self {
		Self::new()
	}
}

impl Document {
	/// Creates a document containing an empty `<body>`.
	pub fn new() -> Self {
		let mut document = Self {
			slots: Vec::new(),
			free: Vec::new(),
			body: NodeId {
				index: 0,
				generation: 0,
			},
		};
		document.body = document.create_element("body", Namespace::Html);
		document
	}

	/// The `<body>` element.
	pub fn body(&self) -> NodeId {
		self.body
	}

	/// Number of arena slots, live or free.
	pub fn slot_count(&self) -> usize {
		self.slots.len()
	}

	/// Number of live nodes, attached or not.
	pub fn live_count(&self) -> usize {
		self.slots.len() - self.free.len()
	}

	fn alloc(&mut self, kind: NodeKind) -> NodeId {
		let node = DomNode {
			kind,
			parent: None,
			children: Vec::new(),
		};
		match self.free.pop() {
			Some(index) => {
				let slot = &mut self.slots[index];
				slot.node = Some(node);
				NodeId {
					index,
					generation: slot.generation,
				}
			}
			None => {
				self.slots.push(Slot {
					generation: 0,
					node: Some(node),
				});
				NodeId {
					index: self.slots.len() - 1,
					generation: 0,
				}
			}
		}
	}

	fn node(&self, id: NodeId) -> Option<&DomNode> {
		self.slots
			.get(id.index)
			.filter(|slot| slot.generation == id.generation)
			.and_then(|slot| slot.node.as_ref())
	}

	fn node_mut(&mut self, id: NodeId) -> Option<&mut DomNode> {
		self.slots
			.get_mut(id.index)
			.filter(|slot| slot.generation == id.generation)
			.and_then(|slot| slot.node.as_mut())
	}

	/// Creates a detached element.
	pub fn create_element(&mut self, tag: &str, namespace: Namespace) -> NodeId {
		self.alloc(NodeKind::Element {
			tag: tag.to_string(),
			namespace,
			is_void: element(tag).is_void,
			attrs: Vec::new(),
		})
	}

	/// Creates a detached text node.
	pub fn create_text(&mut self, text: &str) -> NodeId {
		self.alloc(NodeKind::Text(text.to_string()))
	}

	/// Assigns a DOM property. The value is reflected to the matching attribute.
	///
	/// Has no effect on text nodes or freed ids.
	pub fn set_property(&mut self, id: NodeId, property: &str, value: AttrValue) {
		let name = html::attribute_name(property).into_owned();
		if let Some(DomNode {
			kind: NodeKind::Element { attrs, .. },
			..
		}) = self.node_mut(id)
		{
			match attrs.iter_mut().find(|(n, _)| *n == name) {
				Some(slot) => slot.1 = value,
				None => attrs.push((name, value)),
			}
		}
	}

	/// Reads an attribute.
	pub fn attribute(&self, id: NodeId, name: &str) -> Option<&AttrValue> {
		match &self.node(id)?.kind {
			NodeKind::Element { attrs, .. } => {
				attrs.iter().find(|(n, _)| n == name).map(|(_, value)| value)
			}
			NodeKind::Text(_) => None,
		}
	}

	/// Tag name of an element.
	pub fn tag(&self, id: NodeId) -> Option<&str> {
		match &self.node(id)?.kind {
			NodeKind::Element { tag, .. } => Some(tag),
			NodeKind::Text(_) => None,
		}
	}

	/// Namespace of an element.
	pub fn namespace(&self, id: NodeId) -> Option<Namespace> {
		match &self.node(id)?.kind {
			NodeKind::Element { namespace, .. } => Some(*namespace),
			NodeKind::Text(_) => None,
		}
	}

	/// Child ids in order; empty for freed ids.
	pub fn children(&self, id: NodeId) -> &[NodeId] {
		match self.node(id) {
			Some(node) => &node.children,
			None => &[],
		}
	}

	/// Parent id, if attached.
	pub fn parent(&self, id: NodeId) -> Option<NodeId> {
		self.node(id)?.parent
	}

	/// `true` if `id` has not been freed.
	pub fn contains(&self, id: NodeId) -> bool {
		self.node(id).is_some()
	}

	/// `true` if `id` is `ancestor` or lies below it.
	pub fn is_within(&self, id: NodeId, ancestor: NodeId) -> bool {
		let mut current = Some(id);
		while let Some(node) = current {
			if node == ancestor {
				return true;
			}
			current = self.parent(node);
		}
		false
	}

	fn detach(&mut self, id: NodeId) {
		let Some(parent) = self.node_mut(id).and_then(|node| node.parent.take()) else {
			return;
		};
		if let Some(parent) = self.node_mut(parent) {
			parent.children.retain(|child| *child != id);
		}
	}

	/// Appends `child` to `parent`, detaching it from any previous parent.
	///
	/// Returns `false` when either id has been freed.
	pub fn append(&mut self, parent: NodeId, child: NodeId) -> bool {
		if !self.contains(parent) || !self.contains(child) || self.is_within(parent, child) {
			return false;
		}
		self.detach(child);
		if let Some(node) = self.node_mut(child) {
			node.parent = Some(parent);
		}
		if let Some(node) = self.node_mut(parent) {
			node.children.push(child);
		}
		true
	}

	/// Puts `new` at the position of `old` and frees the `old` subtree.
	///
	/// A detached `old` is simply freed. Returns `false` when either id has
	/// been freed.
	pub fn replace(&mut self, old: NodeId, new: NodeId) -> bool {
		if !self.contains(old) || !self.contains(new) || old == new {
			return false;
		}
		self.detach(new);
		let parent = self.parent(old);
		if let Some(parent) = parent
			&& let Some(node) = self.node_mut(parent)
			&& let Some(slot) = node.children.iter_mut().find(|child| **child == old)
		{
			*slot = new;
		}
		if let Some(node) = self.node_mut(new) {
			node.parent = parent;
		}
		if let Some(node) = self.node_mut(old) {
			node.parent = None;
		}
		self.free(old);
		true
	}

	/// Detaches and frees the subtree rooted at `id`.
	pub fn remove(&mut self, id: NodeId) -> bool {
		if !self.contains(id) || id == self.body {
			return false;
		}
		self.detach(id);
		self.free(id);
		true
	}

	/// Frees every child of `id`.
	pub fn clear_children(&mut self, id: NodeId) {
		let children = self.children(id).to_vec();
		for child in children {
			self.remove(child);
		}
	}

	fn free(&mut self, id: NodeId) {
		let mut pending = vec![id];
		while let Some(next) = pending.pop() {
			let Some(slot) = self
				.slots
				.get_mut(next.index)
				.filter(|slot| slot.generation == next.generation)
			else {
				continue;
			};
			if let Some(node) = slot.node.take() {
				slot.generation = slot.generation.wrapping_add(1);
				self.free.push(next.index);
				pending.extend(node.children);
			}
		}
	}

	/// Finds the first element, in document order below `<body>`, whose `id`
	/// attribute equals `value`.
	pub fn element_by_id(&self, value: &str) -> Option<NodeId> {
		let mut pending = vec![self.body];
		while let Some(id) = pending.pop() {
			if matches!(self.attribute(id, "id"), Some(AttrValue::Text(v)) if v == value) {
				return Some(id);
			}
			pending.extend(self.children(id).iter().rev());
		}
		None
	}

	/// Concatenated text of `id` and its descendants.
	pub fn text_content(&self, id: NodeId) -> String {
		let mut out = String::new();
		self.collect_text(id, &mut out);
		out
	}

	fn collect_text(&self, id: NodeId, out: &mut String) {
		let Some(node) = self.node(id) else {
			return;
		};
		match &node.kind {
			NodeKind::Text(text) => out.push_str(text),
			NodeKind::Element { .. } => {
				for child in &node.children {
					self.collect_text(*child, out);
				}
			}
		}
	}

	/// Serializes `id` including its own tag.
	pub fn outer_html(&self, id: NodeId) -> String {
		let mut out = String::new();
		self.write_node(id, &mut out);
		out
	}

	/// Serializes the children of `id`.
	pub fn inner_html(&self, id: NodeId) -> String {
		let mut out = String::new();
		for child in self.children(id) {
			self.write_node(*child, &mut out);
		}
		out
	}

	fn write_node(&self, id: NodeId, out: &mut String) {
		let Some(node) = self.node(id) else {
			return;
		};
		match &node.kind {
			NodeKind::Text(text) => out.push_str(&html::escape_text(text)),
			NodeKind::Element {
				tag, is_void, attrs, ..
			} => {
				html::write_open_tag(
					out,
					tag,
					attrs.iter().map(|(name, value)| (name.as_str(), value)),
					*is_void,
				);
				if !*is_void {
					for child in &node.children {
						self.write_node(*child, out);
					}
				}
				html::write_close_tag(out, tag, *is_void);
			}
		}
	}
}
