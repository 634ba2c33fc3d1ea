//! Output builders driven by the render engine.
//!
//! The engine makes one evaluation pass and reports what it produces through
//! [`Builder`]. [`MarkupBuilder`] streams markup into a string;
//! [`DomBuilder`] creates nodes in a [`Document`].

use crate::builder::html::Namespace;
use crate::dom::{Document, NodeId};
use crate::html::{self, AttrValue};
use std::cell::RefCell;

/// An element about to be opened.
#[derive(Debug, Clone, Copy)]
pub struct OpenElement<'a> {
	/// Tag name.
	pub tag: &'a str,
	/// Namespace.
	pub namespace: Namespace,
	/// Void elements get no children and no closing tag.
	pub is_void: bool,
	/// Resolved attributes in output order.
	pub attrs: &'a [(String, AttrValue)],
}

/// Receives the output of a render pass.
pub trait Builder {
	/// Identifies a produced element.
	type Handle: Clone;

	/// Opens an element inside the current one and returns its handle.
	fn open(&mut self, element: OpenElement<'_>) -> Self::Handle;

	/// Adds a text node inside the current element.
	fn text(&mut self, text: &str);

	/// Closes the current element.
	fn close(&mut self, tag: &str, is_void: bool);
}

/// Streams markup into a string. Handles are element ordinals.
#[derive(Debug, Default)]
pub struct MarkupBuilder {
	out: String,
	elements: usize,
}

impl MarkupBuilder {
	/// Creates an empty builder.
	pub fn new() -> Self {
		Self::default()
	}

	/// The markup produced so far.
	pub fn as_str(&self) -> &str {
		&self.out
	}

	/// Consumes the builder.
	pub fn into_string(self) -> String {
		self.out
	}
}

impl Builder for MarkupBuilder {
	type Handle = usize;

	fn open(&mut self, element: OpenElement<'_>) -> usize {
		html::write_open_tag(
			&mut self.out,
			element.tag,
			element
				.attrs
				.iter()
				.map(|(name, value)| (name.as_str(), value)),
			element.is_void,
		);
		self.elements += 1;
		self.elements - 1
	}

	fn text(&mut self, text: &str) {
		self.out.push_str(&html::escape_text(text));
	}

	fn close(&mut self, tag: &str, is_void: bool) {
		html::write_close_tag(&mut self.out, tag, is_void);
	}
}

/// Builds detached nodes in a [`Document`].
///
/// The document is borrowed only for the duration of each call, so binding
/// functions evaluated between calls may touch the document themselves.
#[derive(Debug)]
pub struct DomBuilder<'d> {
	document: &'d RefCell<Document>,
	stack: Vec<NodeId>,
	roots: Vec<NodeId>,
}

impl<'d> DomBuilder<'d> {
	/// Creates a builder writing into `document`.
	pub fn new(document: &'d RefCell<Document>) -> Self {
		Self {
			document,
			stack: Vec::new(),
			roots: Vec::new(),
		}
	}

	/// Top-level nodes created so far, in order.
	pub fn roots(&self) -> &[NodeId] {
		&self.roots
	}

	fn attach(&mut self, document: &mut Document, id: NodeId) {
		match self.stack.last() {
			Some(parent) => {
				document.append(*parent, id);
			}
			None => self.roots.push(id),
		}
	}
}

impl Builder for DomBuilder<'_> {
	type Handle = NodeId;

	fn open(&mut self, element: OpenElement<'_>) -> NodeId {
		let document = self.document;
		let mut document = document.borrow_mut();
		let id = document.create_element(element.tag, element.namespace);
		for (name, value) in element.attrs {
			document.set_property(id, &html::property_name(name), value.clone());
		}
		self.attach(&mut document, id);
		self.stack.push(id);
		id
	}

	fn text(&mut self, text: &str) {
		let document = self.document;
		let mut document = document.borrow_mut();
		let id = document.create_text(text);
		self.attach(&mut document, id);
	}

	fn close(&mut self, _tag: &str, _is_void: bool) {
		self.stack.pop();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn drive<B: Builder>(builder: &mut B) {
		let class = [("class".to_string(), AttrValue::Text("x".to_string()))];
		builder.open(OpenElement {
			tag: "ul",
			namespace: Namespace::Html,
			is_void: false,
			attrs: &class,
		});
		builder.open(OpenElement {
			tag: "li",
			namespace: Namespace::Html,
			is_void: false,
			attrs: &[],
		});
		builder.text("a < b");
		builder.close("li", false);
		builder.open(OpenElement {
			tag: "br",
			namespace: Namespace::Html,
			is_void: true,
			attrs: &[],
		});
		builder.close("br", true);
		builder.close("ul", false);
	}

	#[test]
	fn test_markup_and_dom_agree() {
		let mut markup = MarkupBuilder::new();
		drive(&mut markup);

		let document = RefCell::new(Document::new());
		let mut dom = DomBuilder::new(&document);
		drive(&mut dom);
		let root = dom.roots()[0];

		let expected = "<ul class=\"x\"><li>a &lt; b</li><br /></ul>";
		assert_eq!(markup.as_str(), expected);
		assert_eq!(document.borrow().outer_html(root), expected);
	}

	#[test]
	fn test_dom_builder_leaves_roots_detached() {
		let document = RefCell::new(Document::new());
		let mut dom = DomBuilder::new(&document);
		drive(&mut dom);
		let root = dom.roots()[0];
		assert_eq!(document.borrow().parent(root), None);
	}
}
