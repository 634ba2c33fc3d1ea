//! Markup serialization shared by the string target and the DOM serializer.
//!
//! Both outputs go through the same functions, which keeps a server render
//! and a serialized client DOM byte-for-byte comparable.

use std::borrow::Cow;

/// Attribute names that have a different DOM property name.
const PROPERTY_ALIASES: &[(&str, &str)] = &[
	("class", "className"),
	("for", "htmlFor"),
	("http-equiv", "httpEquiv"),
	("tabindex", "tabIndex"),
	("readonly", "readOnly"),
];

/// Maps a DOM property name back to its attribute name.
///
/// `className` becomes `class`, `htmlFor` becomes `for`; names without an
/// alias pass through.
pub fn attribute_name(name: &str) -> Cow<'_, str> {
	PROPERTY_ALIASES
		.iter()
		.find(|(_, property)| *property == name)
		.map_or(Cow::Borrowed(name), |(attribute, _)| Cow::Borrowed(*attribute))
}

/// Maps an attribute name to the DOM property it is assigned through.
pub fn property_name(name: &str) -> Cow<'_, str> {
	PROPERTY_ALIASES
		.iter()
		.find(|(attribute, _)| *attribute == name)
		.map_or(Cow::Borrowed(name), |(_, property)| Cow::Borrowed(*property))
}

/// Escapes text content.
pub fn escape_text(s: &str) -> String {
	s.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
}

/// Escapes an attribute value for use inside double quotes.
pub fn escape_attr(s: &str) -> String {
	s.replace('&', "&amp;")
		.replace('"', "&quot;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
}

/// An attribute value after property resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
	/// `name="value"`.
	Text(String),
	/// A present boolean attribute, written as the bare name.
	Flag,
}

/// Writes `<tag attrs>` (or `<tag attrs />` for void elements).
pub fn write_open_tag<'a, I>(out: &mut String, tag: &str, attrs: I, is_void: bool)
where
	I: IntoIterator<Item = (&'a str, &'a AttrValue)>,
{
	out.push('<');
	out.push_str(tag);
	for (name, value) in attrs {
		out.push(' ');
		out.push_str(name);
		if let AttrValue::Text(text) = value {
			out.push_str("=\"");
			out.push_str(&escape_attr(text));
			out.push('"');
		}
	}
	if is_void {
		out.push_str(" />");
	} else {
		out.push('>');
	}
}

/// Writes `</tag>` unless the element is void.
pub fn write_close_tag(out: &mut String, tag: &str, is_void: bool) {
	if !is_void {
		out.push_str("</");
		out.push_str(tag);
		out.push('>');
	}
}

/// Escapes JSON for embedding in a `<script>` element.
///
/// `</` becomes `<\/`, which JSON decoders read back as `</` while HTML
/// parsers no longer see a closing tag.
pub fn escape_json_for_script(json: &str) -> String {
	json.replace("</", "<\\/")
}
