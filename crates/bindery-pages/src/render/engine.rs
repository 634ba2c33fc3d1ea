//! The evaluation pass shared by both outputs.
//!
//! For one node, in order: skip it when its `if` is false; normalize the
//! shorthand through the element catalog and let explicit properties
//! override it; resolve every property (binding functions only on bound
//! nodes); open the element with its attributes and markers; record the
//! registration; recurse into the content; close.
//!
//! Registrations are collected in the engine and handed back by
//! [`Engine::finish`], so nothing outside the engine is borrowed while
//! binding functions run.

use super::target::{Builder, OpenElement};
use crate::binding::NewBinding;
use crate::builder::html::{ElementSpec, Elements, element};
use crate::component::{Content, Node, Prop, PropValue, value_to_text};
use crate::html::{self, AttrValue};
use crate::path::Path;
use crate::pipe::PipeContext;
use crate::ssr::markers::{BindingMarker, IdAllocator};
use crate::store::Store;
use serde_json::Value;
use std::borrow::Cow;

/// Properties whose values become content instead of attributes.
const STRUCTURAL: &[&str] = &["text", "child", "children"];

/// How properties of one node are evaluated.
enum Eval<'v> {
	/// No binding: static properties only.
	Unbound,
	/// Binding functions run against `value`.
	Bound {
		value: Option<&'v Value>,
		pipe: &'v PipeContext,
	},
	/// Bound, but there is nothing to show: static attributes only.
	Cleared,
}

#[derive(Default)]
struct Resolved {
	attrs: Vec<(String, AttrValue)>,
	contents: Vec<Content>,
}

/// One render pass over a [`Builder`].
pub(crate) struct Engine<'a, B: Builder> {
	builder: &'a mut B,
	store: &'a Store,
	markers: bool,
	ids: IdAllocator,
	bindings: Vec<NewBinding<B::Handle>>,
}

impl<'a, B: Builder> Engine<'a, B> {
	/// Creates a pass reading from `store`.
	pub(crate) fn new(builder: &'a mut B, store: &'a Store, ids: IdAllocator, markers: bool) -> Self {
		Self {
			builder,
			store,
			markers,
			ids,
			bindings: Vec::new(),
		}
	}

	/// Renders `node`; `None` when its `if` is false.
	pub(crate) fn render(&mut self, node: &Node) -> Option<B::Handle> {
		if node.condition() == Some(false) {
			return None;
		}
		let spec = element(node.tag());

		let Some(path) = node.binding() else {
			let resolved = self.resolve(node, &spec, &Eval::Unbound);
			return Some(self.emit(node, &spec, resolved, None));
		};

		let id = self.ids.next_id();
		let pipe = PipeContext::from_pipe(node.declared_pipe());
		// A path whose prefixes do not resolve yet renders cleared until set.
		let value = self
			.store
			.is_bindable(path)
			.then(|| self.store.get(path));
		Some(self.bound(node, &spec, &id, path, &pipe, value.as_ref().map(Option::as_ref), true))
	}

	/// Re-evaluates a registered node with a fresh `value`.
	///
	/// An absent value clears the element. The registration itself is not
	/// recorded again; bound descendants are.
	pub(crate) fn rerender(
		&mut self,
		id: &str,
		path: &Path,
		node: &Node,
		pipe: &PipeContext,
		value: Option<&Value>,
	) -> B::Handle {
		let spec = element(node.tag());
		self.bound(node, &spec, id, path, pipe, value.map(Some), false)
	}

	/// Ends the pass, returning the registrations in render order.
	pub(crate) fn finish(self) -> (Vec<NewBinding<B::Handle>>, IdAllocator) {
		(self.bindings, self.ids)
	}

	#[allow(clippy::too_many_arguments)]
	fn bound(
		&mut self,
		node: &Node,
		spec: &ElementSpec,
		id: &str,
		path: &Path,
		pipe: &PipeContext,
		value: Option<Option<&Value>>,
		register: bool,
	) -> B::Handle {
		let eval = match value {
			Some(value) => Eval::Bound { value, pipe },
			None => Eval::Cleared,
		};
		let resolved = self.resolve(node, spec, &eval);
		let marker = BindingMarker::new(id, path, node.declared_pipe());

		let handle = self.open(node, spec, resolved.attrs, Some(&marker));
		if register {
			self.bindings.push(NewBinding {
				id: id.to_string(),
				path: path.clone(),
				node: node.clone(),
				element: handle.clone(),
				pipe: pipe.clone(),
			});
		}

		self.ids.enter(id);
		self.contents(resolved.contents);
		self.ids.leave();
		self.builder.close(node.tag(), spec.is_void);
		handle
	}

	fn emit(
		&mut self,
		node: &Node,
		spec: &ElementSpec,
		resolved: Resolved,
		marker: Option<&BindingMarker>,
	) -> B::Handle {
		let handle = self.open(node, spec, resolved.attrs, marker);
		self.contents(resolved.contents);
		self.builder.close(node.tag(), spec.is_void);
		handle
	}

	fn open(
		&mut self,
		node: &Node,
		spec: &ElementSpec,
		mut attrs: Vec<(String, AttrValue)>,
		marker: Option<&BindingMarker>,
	) -> B::Handle {
		if self.markers
			&& let Some(marker) = marker
		{
			attrs.extend(marker.to_attrs());
		}
		self.builder.open(OpenElement {
			tag: node.tag(),
			namespace: spec.namespace,
			is_void: spec.is_void,
			attrs: &attrs,
		})
	}

	fn contents(&mut self, contents: Vec<Content>) {
		for content in contents {
			match content {
				Content::Text(text) => self.builder.text(&text),
				Content::Element(child) => {
					self.render(&child);
				}
			}
		}
	}

	fn resolve(&self, node: &Node, spec: &ElementSpec, eval: &Eval<'_>) -> Resolved {
		let mut props = spec.normalize(node.raw_shorthand().clone());
		for (name, prop) in node.props() {
			let key = html::attribute_name(name);
			match props
				.iter_mut()
				.find(|(existing, _)| html::attribute_name(existing) == key)
			{
				Some(slot) => *slot = (name.clone(), prop.clone()),
				None => props.push((name.clone(), prop.clone())),
			}
		}

		let mut resolved = Resolved::default();
		for (name, prop) in props {
			let structural = STRUCTURAL.contains(&&*name);
			let value = match (prop, eval) {
				(_, Eval::Cleared) if structural => continue,
				(Prop::Static(value), _) => value,
				(Prop::Bound(f), Eval::Bound { value, pipe }) => f(*value, &Elements, pipe),
				(Prop::Bound(_), _) => continue,
			};

			if structural {
				if !spec.is_void {
					resolved.contents.extend(value.into_contents());
				}
			} else if let Some(attr) = attr_value(value) {
				resolved.attrs.push((attribute(&name), attr));
			}
		}
		resolved
	}
}

fn attribute(name: &Cow<'static, str>) -> String {
	html::attribute_name(name).into_owned()
}

/// Attribute form of a resolved value; `None` omits the attribute.
fn attr_value(value: PropValue) -> Option<AttrValue> {
	match value {
		PropValue::Str(text) | PropValue::Json(Value::String(text)) => Some(AttrValue::Text(text)),
		PropValue::Bool(true) | PropValue::Json(Value::Bool(true)) => Some(AttrValue::Flag),
		PropValue::Bool(false)
		| PropValue::Json(Value::Bool(false))
		| PropValue::Json(Value::Null)
		| PropValue::Absent
		| PropValue::Child(_)
		| PropValue::Children(_) => None,
		PropValue::Json(other) => Some(AttrValue::Text(value_to_text(&other))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::builder::html::{a, div, img, input, li, span, ul};
	use crate::pipe::Pipe;
	use crate::render::target::MarkupBuilder;
	use rstest::rstest;
	use serde_json::json;

	fn render(node: &Node, data: Value, markers: bool) -> (String, Vec<NewBinding<usize>>) {
		let store = Store::with_data(data);
		let mut builder = MarkupBuilder::new();
		let mut engine = Engine::new(&mut builder, &store, IdAllocator::new(), markers);
		engine.render(node);
		let (bindings, _) = engine.finish();
		(builder.into_string(), bindings)
	}

	#[rstest]
	#[case(a("/home"), "<a href=\"/home\"></a>")]
	#[case(img("/x.png"), "<img src=\"/x.png\" />")]
	#[case(input("v"), "<input value=\"v\" />")]
	#[case(span("hi"), "<span>hi</span>")]
	#[case(ul(vec![li("a"), li("b")]), "<ul><li>a</li><li>b</li></ul>")]
	#[case(div(json!({"className": "x", "hidden": true})), "<div class=\"x\" hidden></div>")]
	fn test_shorthand_rendering(#[case] node: Node, #[case] expected: &str) {
		assert_eq!(render(&node, json!({}), false).0, expected);
	}

	#[test]
	fn test_explicit_props_override_shorthand() {
		let node = div(json!({"class": "a"})).attr("className", "b").text("t");
		assert_eq!(render(&node, json!({}), false).0, "<div class=\"b\">t</div>");
	}

	#[test]
	fn test_false_condition_renders_nothing() {
		let node = div(()).child(span("shown")).child(span("hidden").when(false));
		assert_eq!(render(&node, json!({}), false).0, "<div><span>shown</span></div>");
	}

	#[test]
	fn test_bound_function_ignored_without_binding() {
		let node = div(()).bound("text", |_, _, _| PropValue::from("never"));
		assert_eq!(render(&node, json!({}), false).0, "<div></div>");
	}

	#[test]
	fn test_binding_registers_before_children() {
		let node = div(())
			.bind("user")
			.bound("children", |user, el, _| {
				let name = user.and_then(|u| u.get("name")).cloned().unwrap_or_default();
				PropValue::child(el.span(()).bind("user.name").bound("text", move |_, _, _| {
					PropValue::Json(name.clone())
				}))
			});

		let (html, bindings) = render(&node, json!({"user": {"name": "Ada"}}), true);

		assert_eq!(
			html,
			"<div data-bd-id=\"b0\" data-bd-bind=\"user\"><span data-bd-id=\"b0.0\" data-bd-bind=\"user.name\">Ada</span></div>"
		);
		let ids: Vec<&str> = bindings.iter().map(|b| b.id.as_str()).collect();
		assert_eq!(ids, vec!["b0", "b0.0"]);
		assert_eq!(bindings[0].element, 0);
		assert_eq!(bindings[1].element, 1);
	}

	#[test]
	fn test_absent_value_reaches_binding_function() {
		let node = span(())
			.bind("missing")
			.bound("text", |value, _, _| match value {
				Some(v) => PropValue::Json(v.clone()),
				None => PropValue::from("fallback"),
			});
		assert_eq!(render(&node, json!({}), false).0, "<span>fallback</span>");
	}

	#[test]
	fn test_unbindable_path_renders_cleared() {
		let node = span(())
			.class("c")
			.bind("a.b.c")
			.text("static text")
			.bound("title", |_, _, _| PropValue::from("bound"));

		let (html, bindings) = render(&node, json!({"a": {"b": 3}}), false);

		assert_eq!(html, "<span class=\"c\"></span>");
		assert_eq!(bindings.len(), 1);
	}

	#[test]
	fn test_pipe_context_reaches_binding_function() {
		let node = span(())
			.bind("name")
			.pipe(Pipe::new().func("shout", |v| json!(v.as_str().unwrap_or_default().to_uppercase())))
			.bound("text", |value, _, pipe| {
				let value = value.cloned().unwrap_or_default();
				PropValue::Json(pipe.call("shout", &value).unwrap_or_default())
			});

		assert_eq!(render(&node, json!({"name": "ada"}), false).0, "<span>ADA</span>");
	}

	#[test]
	fn test_rerender_with_absent_value_clears() {
		let store = Store::with_data(json!({"items": ["x"]}));
		let node = ul(())
			.class("list")
			.bind("items")
			.bound("children", |items, el, _| {
				PropValue::children(
					items
						.and_then(Value::as_array)
						.into_iter()
						.flatten()
						.map(|item| el.li(item)),
				)
			});
		let mut builder = MarkupBuilder::new();
		let mut engine = Engine::new(&mut builder, &store, IdAllocator::new(), false);

		engine.rerender("b0", &Path::new("items"), &node, &PipeContext::empty(), None);

		assert_eq!(builder.into_string(), "<ul class=\"list\"></ul>");
	}
}
