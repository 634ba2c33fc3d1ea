//! HTML and SVG element catalog
//!
//! Every tag has an [`ElementSpec`] entry: its namespace, whether it is a void
//! element, and the normalizer that turns a raw [`Shorthand`] into canonical
//! properties. The render engine looks the spec up by tag instead of
//! branching on tag names.
//!
//! ## Shorthand rules
//!
//! | Shorthand | Tags | Becomes |
//! |-----------|------|---------|
//! | string | `a`, `link`, `area`, `base` | `href` |
//! | string | `img`, `script`, `iframe`, `audio`, `video`, `source`, `track`, `embed` | `src` |
//! | string | `input`, `option`, `data`, `meter`, `progress` | `value` |
//! | string | anything else | `text` |
//! | list | any | `children` |
//! | mapping | any | one property per key |
//!
//! ## Example
//!
//! ```
//! use bindery_pages::builder::html::{li, ul};
//!
//! let list = ul(vec![li("one"), li("two")]).class("items");
//! assert_eq!(list.tag(), "ul");
//! ```

use crate::component::{Content, NODE_KEYS, Node, Prop, PropValue, Shorthand};
use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::collections::HashMap;

/// XML namespace an element is created in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
	/// `http://www.w3.org/1999/xhtml`
	Html,
	/// `http://www.w3.org/2000/svg`
	Svg,
}

impl Namespace {
	/// The namespace URI.
	pub fn uri(self) -> &'static str {
		match self {
			Self::Html => "http://www.w3.org/1999/xhtml",
			Self::Svg => "http://www.w3.org/2000/svg",
		}
	}
}

/// Turns a raw shorthand into canonical properties.
pub type Normalizer = fn(Shorthand) -> Vec<(Cow<'static, str>, Prop)>;

/// Catalog entry for one tag.
#[derive(Clone, Copy)]
pub struct ElementSpec {
	/// Tag name.
	pub tag: &'static str,
	/// Namespace the element lives in.
	pub namespace: Namespace,
	/// Void elements have no closing tag and no children.
	pub is_void: bool,
	normalize: Normalizer,
}

impl std::fmt::Debug for ElementSpec {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ElementSpec")
			.field("tag", &self.tag)
			.field("namespace", &self.namespace)
			.field("is_void", &self.is_void)
			.finish()
	}
}

impl ElementSpec {
	/// Normalizes a shorthand for this tag.
	pub fn normalize(&self, shorthand: Shorthand) -> Vec<(Cow<'static, str>, Prop)> {
		(self.normalize)(shorthand)
	}
}

fn normalize_as(text_prop: &'static str, shorthand: Shorthand) -> Vec<(Cow<'static, str>, Prop)> {
	match shorthand {
		Shorthand::None => Vec::new(),
		Shorthand::Text(text) => vec![(Cow::Borrowed(text_prop), Prop::Static(PropValue::Str(text)))],
		Shorthand::List(children) => vec![(
			Cow::Borrowed("children"),
			Prop::Static(PropValue::Children(children)),
		)],
		Shorthand::Map(map) => map
			.into_iter()
			.filter(|(key, _)| !NODE_KEYS.contains(&key.as_str()))
			.map(|(key, value)| (Cow::Owned(key), Prop::Static(PropValue::Json(value))))
			.collect(),
	}
}

fn text(shorthand: Shorthand) -> Vec<(Cow<'static, str>, Prop)> {
	normalize_as("text", shorthand)
}

fn href(shorthand: Shorthand) -> Vec<(Cow<'static, str>, Prop)> {
	normalize_as("href", shorthand)
}

fn src(shorthand: Shorthand) -> Vec<(Cow<'static, str>, Prop)> {
	normalize_as("src", shorthand)
}

fn value(shorthand: Shorthand) -> Vec<(Cow<'static, str>, Prop)> {
	normalize_as("value", shorthand)
}

/// Spec used for tags outside the catalog (custom elements).
const CUSTOM: ElementSpec = ElementSpec {
	tag: "",
	namespace: Namespace::Html,
	is_void: false,
	normalize: text,
};

/// The element namespace handed to binding functions.
///
/// It exposes the same constructors as the free functions in this module.
#[derive(Debug, Clone, Copy, Default)]
pub struct Elements;

impl Elements {
	/// Creates a node for any tag, applying that tag's shorthand rules.
	pub fn create(&self, tag: &str, shorthand: impl Into<Shorthand>) -> Node {
		Node::new(Cow::Owned(tag.to_string())).shorthand(shorthand)
	}

	/// Looks up the catalog entry for `tag`.
	pub fn spec(&self, tag: &str) -> ElementSpec {
		element(tag)
	}
}

macro_rules! catalog {
	($($name:ident => $tag:literal, $ns:ident, $void:literal, $norm:ident;)*) => {
		static SPECS: &[ElementSpec] = &[
			$(ElementSpec { tag: $tag, namespace: Namespace::$ns, is_void: $void, normalize: $norm },)*
		];

		$(
			#[doc = concat!("Creates a `<", $tag, ">` node from a shorthand.")]
			pub fn $name(shorthand: impl Into<Shorthand>) -> Node {
				Node::new($tag).shorthand(shorthand)
			}
		)*

		impl Elements {
			$(
				#[doc = concat!("Creates a `<", $tag, ">` node from a shorthand.")]
				pub fn $name(&self, shorthand: impl Into<Shorthand>) -> Node {
					$name(shorthand)
				}
			)*
		}
	};
}

catalog! {
	html => "html", Html, false, text;
	head => "head", Html, false, text;
	body => "body", Html, false, text;
	title => "title", Html, false, text;
	meta => "meta", Html, true, text;
	link => "link", Html, true, href;
	base => "base", Html, true, href;
	style => "style", Html, false, text;
	script => "script", Html, false, src;
	noscript => "noscript", Html, false, text;
	main => "main", Html, false, text;
	header => "header", Html, false, text;
	footer => "footer", Html, false, text;
	nav => "nav", Html, false, text;
	section => "section", Html, false, text;
	article => "article", Html, false, text;
	aside => "aside", Html, false, text;
	address => "address", Html, false, text;
	div => "div", Html, false, text;
	span => "span", Html, false, text;
	p => "p", Html, false, text;
	h1 => "h1", Html, false, text;
	h2 => "h2", Html, false, text;
	h3 => "h3", Html, false, text;
	h4 => "h4", Html, false, text;
	h5 => "h5", Html, false, text;
	h6 => "h6", Html, false, text;
	hr => "hr", Html, true, text;
	br => "br", Html, true, text;
	wbr => "wbr", Html, true, text;
	pre => "pre", Html, false, text;
	blockquote => "blockquote", Html, false, text;
	ul => "ul", Html, false, text;
	ol => "ol", Html, false, text;
	li => "li", Html, false, text;
	dl => "dl", Html, false, text;
	dt => "dt", Html, false, text;
	dd => "dd", Html, false, text;
	figure => "figure", Html, false, text;
	figcaption => "figcaption", Html, false, text;
	a => "a", Html, false, href;
	em => "em", Html, false, text;
	strong => "strong", Html, false, text;
	small => "small", Html, false, text;
	b => "b", Html, false, text;
	i => "i", Html, false, text;
	u => "u", Html, false, text;
	s => "s", Html, false, text;
	mark => "mark", Html, false, text;
	code => "code", Html, false, text;
	kbd => "kbd", Html, false, text;
	samp => "samp", Html, false, text;
	var => "var", Html, false, text;
	sub => "sub", Html, false, text;
	sup => "sup", Html, false, text;
	q => "q", Html, false, text;
	cite => "cite", Html, false, text;
	abbr => "abbr", Html, false, text;
	time => "time", Html, false, text;
	data => "data", Html, false, value;
	img => "img", Html, true, src;
	picture => "picture", Html, false, text;
	source => "source", Html, true, src;
	track => "track", Html, true, src;
	audio => "audio", Html, false, src;
	video => "video", Html, false, src;
	iframe => "iframe", Html, false, src;
	embed => "embed", Html, true, src;
	object => "object", Html, false, text;
	canvas => "canvas", Html, false, text;
	map => "map", Html, false, text;
	area => "area", Html, true, href;
	table => "table", Html, false, text;
	caption => "caption", Html, false, text;
	thead => "thead", Html, false, text;
	tbody => "tbody", Html, false, text;
	tfoot => "tfoot", Html, false, text;
	tr => "tr", Html, false, text;
	th => "th", Html, false, text;
	td => "td", Html, false, text;
	col => "col", Html, true, text;
	colgroup => "colgroup", Html, false, text;
	form => "form", Html, false, text;
	fieldset => "fieldset", Html, false, text;
	legend => "legend", Html, false, text;
	label => "label", Html, false, text;
	input => "input", Html, true, value;
	button => "button", Html, false, text;
	select => "select", Html, false, text;
	optgroup => "optgroup", Html, false, text;
	option => "option", Html, false, value;
	textarea => "textarea", Html, false, text;
	output => "output", Html, false, text;
	progress => "progress", Html, false, value;
	meter => "meter", Html, false, value;
	details => "details", Html, false, text;
	summary => "summary", Html, false, text;
	dialog => "dialog", Html, false, text;
	template => "template", Html, false, text;
	slot => "slot", Html, false, text;
	svg => "svg", Svg, false, text;
	g => "g", Svg, false, text;
	defs => "defs", Svg, false, text;
	symbol => "symbol", Svg, false, text;
	path => "path", Svg, false, text;
	circle => "circle", Svg, false, text;
	ellipse => "ellipse", Svg, false, text;
	rect => "rect", Svg, false, text;
	line => "line", Svg, false, text;
	polyline => "polyline", Svg, false, text;
	polygon => "polygon", Svg, false, text;
	tspan => "tspan", Svg, false, text;
	linear_gradient => "linearGradient", Svg, false, text;
	radial_gradient => "radialGradient", Svg, false, text;
	stop => "stop", Svg, false, text;
	clip_path => "clipPath", Svg, false, text;
	mask => "mask", Svg, false, text;
	pattern => "pattern", Svg, false, text;
	foreign_object => "foreignObject", Svg, false, text;
}

static CATALOG: Lazy<HashMap<&'static str, ElementSpec>> =
	Lazy::new(|| SPECS.iter().map(|spec| (spec.tag, *spec)).collect());

/// Looks up the catalog entry for `tag`; unknown tags get HTML defaults.
pub fn element(tag: &str) -> ElementSpec {
	CATALOG.get(tag).copied().unwrap_or(CUSTOM)
}

/// `true` if `tag` is a known catalog entry.
pub fn is_known(tag: &str) -> bool {
	CATALOG.contains_key(tag)
}

/// Creates a text child.
pub fn text_node(text: impl Into<String>) -> Content {
	Content::Text(text.into())
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	fn prop_names<'a>(props: &'a [(Cow<'static, str>, Prop)]) -> Vec<&'a str> {
		props.iter().map(|(name, _)| name.as_ref()).collect()
	}

	#[rstest]
	#[case("a", "href")]
	#[case("img", "src")]
	#[case("input", "value")]
	#[case("li", "text")]
	#[case("my-widget", "text")]
	fn test_string_shorthand_target(#[case] tag: &str, #[case] prop: &str) {
		let props = element(tag).normalize(Shorthand::from("x"));
		assert_eq!(prop_names(&props), vec![prop]);
	}

	#[test]
	fn test_list_shorthand_becomes_children() {
		let props = element("ul").normalize(Shorthand::from(vec![li("a"), li("b")]));
		assert_eq!(prop_names(&props), vec!["children"]);
		assert!(matches!(&props[0].1, Prop::Static(PropValue::Children(c)) if c.len() == 2));
	}

	#[test]
	fn test_map_shorthand_becomes_properties() {
		let props = element("div").normalize(Shorthand::from(json!({"class": "x", "id": "y"})));
		let mut names = prop_names(&props);
		names.sort();
		assert_eq!(names, vec!["class", "id"]);
	}

	#[test]
	fn test_map_shorthand_drops_node_keys() {
		let props = element("div").normalize(Shorthand::Map(
			json!({"if": false, "binding": "a", "pipe": {}, "text": "x"})
				.as_object()
				.cloned()
				.unwrap(),
		));
		assert_eq!(prop_names(&props), vec!["text"]);
	}

	#[test]
	fn test_void_and_namespace() {
		assert!(element("br").is_void);
		assert!(!element("div").is_void);
		assert_eq!(element("circle").namespace, Namespace::Svg);
		assert_eq!(element("linearGradient").namespace, Namespace::Svg);
		assert!(is_known("table"));
		assert!(!is_known("my-widget"));
	}

	#[test]
	fn test_elements_namespace_matches_free_functions() {
		let el = Elements;
		assert_eq!(el.li("x").tag(), li("x").tag());
		assert_eq!(el.create("section", ()).tag(), "section");
	}
}
