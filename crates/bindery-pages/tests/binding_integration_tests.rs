//! Integration tests for store-driven re-rendering
//!
//! These tests drive the client runtime through the public mutation API:
//! 1. Bound lists follow `set` / `push` / `remove`
//! 2. Only the most specific bindings re-render
//! 3. Re-rendering without a mutation is idempotent
//! 4. Re-entrant mutations that loop back are rejected

use bindery_pages::builder::html::{div, span, ul};
use bindery_pages::client::{self as client_mod, Client, ClientOptions, Target};
use bindery_pages::component::{Node, PropValue};
use bindery_pages::error::Error;
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A `<span>` showing the bound value and counting its evaluations.
fn counted_text(path: &'static str, renders: Arc<AtomicUsize>) -> Node {
	span(()).bind(path).bound("text", move |value, _, _| {
		renders.fetch_add(1, Ordering::SeqCst);
		value.cloned().map_or(PropValue::Absent, PropValue::Json)
	})
}

fn todo_list() -> Node {
	ul(())
		.bind("test")
		.bound("class", |test, _, _| {
			test.and_then(|t| t.get("class"))
				.cloned()
				.map_or(PropValue::Absent, PropValue::Json)
		})
		.bound("children", |test, el, _| {
			let items = test.and_then(|t| t.get("children")).and_then(Value::as_array);
			PropValue::children(items.into_iter().flatten().map(|item| el.li(item)))
		})
}

fn li_texts(client: &Client) -> Vec<String> {
	client.document(|doc| {
		let list = doc.children(doc.body())[0];
		doc.children(list).iter().map(|li| doc.text_content(*li)).collect()
	})
}

#[fixture]
fn client() -> Client {
	Client::new()
}

// ============================================================================
// Bound list scenario
// ============================================================================

#[rstest]
fn test_push_appends_list_item(client: Client) {
	client
		.store()
		.set("test", json!({"class": "x", "children": ["one", "two"]}))
		.unwrap();
	client.render(&todo_list(), None, Target::Attach(client.body()));
	assert_eq!(li_texts(&client), vec!["one", "two"]);

	client.store().push("test.children", json!("three")).unwrap();

	assert_eq!(li_texts(&client), vec!["one", "two", "three"]);
	assert_eq!(
		client.inner_html(client.body()),
		"<ul class=\"x\" data-bd-id=\"b0\" data-bd-bind=\"test\"><li>one</li><li>two</li><li>three</li></ul>"
	);
}

#[rstest]
fn test_push_to_non_sequence_leaves_output(client: Client) {
	client.render(
		&todo_list(),
		Some(json!({"test": {"children": "nope"}})),
		Target::Attach(client.body()),
	);
	let before = client.inner_html(client.body());

	let err = client.store().push("test.children", json!("x")).unwrap_err();

	assert!(matches!(err, Error::TypeKind { .. }));
	assert_eq!(client.inner_html(client.body()), before);
}

#[rstest]
fn test_removal_clears_output(client: Client) {
	client.render(
		&todo_list(),
		Some(json!({"test": {"class": "x", "children": ["one"]}})),
		Target::Attach(client.body()),
	);

	client.store().remove("test").unwrap();

	assert_eq!(
		client.inner_html(client.body()),
		"<ul data-bd-id=\"b0\" data-bd-bind=\"test\"></ul>"
	);

	client.store().set("test", json!({"children": ["back"]})).unwrap();
	assert_eq!(li_texts(&client), vec!["back"]);
}

#[rstest]
fn test_static_attributes_survive_clearing(client: Client) {
	let node = span("initial").class("label").bind("name").bound("text", |v, _, _| {
		v.cloned().map_or(PropValue::Absent, PropValue::Json)
	});
	client.render(&node, Some(json!({"name": "Ada"})), Target::Attach(client.body()));

	client.store().remove("name").unwrap();

	assert_eq!(
		client.inner_html(client.body()),
		"<span class=\"label\" data-bd-id=\"b0\" data-bd-bind=\"name\"></span>"
	);
}

// ============================================================================
// Specificity
// ============================================================================

#[rstest]
#[case("a.b", 0, 1)]
#[case("a.c", 1, 0)]
#[case("a", 1, 1)]
#[case("z", 0, 0)]
fn test_specificity(
	client: Client,
	#[case] mutated: &str,
	#[case] outer: usize,
	#[case] inner: usize,
) {
	let a_renders = Arc::new(AtomicUsize::new(0));
	let ab_renders = Arc::new(AtomicUsize::new(0));
	let body = client.body();
	client.render(
		&counted_text("a", Arc::clone(&a_renders)),
		Some(json!({"a": {"b": 1, "c": 2}, "z": 0})),
		Target::Attach(body),
	);
	client.render(&counted_text("a.b", Arc::clone(&ab_renders)), None, Target::Attach(body));
	a_renders.store(0, Ordering::SeqCst);
	ab_renders.store(0, Ordering::SeqCst);

	client.store().set(mutated, json!({"b": 9})).unwrap();

	assert_eq!(a_renders.load(Ordering::SeqCst), outer);
	assert_eq!(ab_renders.load(Ordering::SeqCst), inner);
}

#[rstest]
fn test_unrelated_bindings_are_independent(client: Client) {
	let left = Arc::new(AtomicUsize::new(0));
	let right = Arc::new(AtomicUsize::new(0));
	let body = client.body();
	client.render(
		&counted_text("shop.cart", Arc::clone(&left)),
		Some(json!({"shop": {"cart": 1, "wishlist": 2}})),
		Target::Attach(body),
	);
	client.render(&counted_text("shop.wishlist", Arc::clone(&right)), None, Target::Attach(body));

	client.store().set("shop", json!({"cart": 5, "wishlist": 6})).unwrap();

	assert_eq!(left.load(Ordering::SeqCst), 2);
	assert_eq!(right.load(Ordering::SeqCst), 2);
	assert_eq!(
		client.inner_html(body),
		"<span data-bd-id=\"b0\" data-bd-bind=\"shop.cart\">5</span><span data-bd-id=\"b1\" data-bd-bind=\"shop.wishlist\">6</span>"
	);
}

#[rstest]
fn test_nested_binding_rerenders_alone(client: Client) {
	let outer = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&outer);
	let node = div(()).bind("user").bound("children", move |_, el, _| {
		counter.fetch_add(1, Ordering::SeqCst);
		PropValue::child(el.span(()).bind("user.name").bound("text", |v, _, _| {
			v.cloned().map_or(PropValue::Absent, PropValue::Json)
		}))
	});
	client.render(&node, Some(json!({"user": {"name": "Ada"}})), Target::Attach(client.body()));

	client.store().set("user.name", json!("Grace")).unwrap();

	assert_eq!(outer.load(Ordering::SeqCst), 1);
	assert_eq!(
		client.inner_html(client.body()),
		"<div data-bd-id=\"b0\" data-bd-bind=\"user\"><span data-bd-id=\"b0.0\" data-bd-bind=\"user.name\">Grace</span></div>"
	);
	assert_eq!(client.binding_count(), 2);
}

// ============================================================================
// Idempotence
// ============================================================================

#[rstest]
fn test_rerender_is_idempotent(client: Client) {
	client.render(
		&todo_list(),
		Some(json!({"test": {"class": "x", "children": ["one", "two"]}})),
		Target::Attach(client.body()),
	);
	let snapshot = client.store().get("test").unwrap();

	client.store().set("test", snapshot.clone()).unwrap();
	let first = client.inner_html(client.body());
	client.store().set("test", snapshot).unwrap();
	let second = client.inner_html(client.body());

	assert_eq!(first, second);
	assert_eq!(client.binding_count(), 1);
}

#[rstest]
fn test_repeated_rerender_reuses_document_slots(client: Client) {
	let items = json!({"class": "x", "children": ["one", "two", "three"]});
	client.render(&todo_list(), Some(json!({"test": items.clone()})), Target::Attach(client.body()));
	client.store().set("test", items.clone()).unwrap();
	let slots = client.document(|doc| doc.slot_count());

	for _ in 0..50 {
		client.store().set("test", items.clone()).unwrap();
	}

	assert_eq!(client.document(|doc| doc.slot_count()), slots);
	assert_eq!(li_texts(&client), vec!["one", "two", "three"]);
}

// ============================================================================
// Re-entrant mutation
// ============================================================================

/// A `<span>` bound to `path` that writes its own value back on every render.
fn echo(path: &'static str) -> Node {
	span(()).bind(path).bound("text", move |value, _, _| {
		if let (Some(client), Some(value)) = (client_mod::current(), value) {
			let _ = client.store().set(path, value.clone());
		}
		value.cloned().map_or(PropValue::Absent, PropValue::Json)
	})
}

/// A `<span>` bound to `from` that copies its value to `to`.
fn forward(from: &'static str, to: &'static str) -> Node {
	span(()).bind(from).bound("text", move |value, _, _| {
		if let (Some(client), Some(value)) = (client_mod::current(), value) {
			let _ = client.store().set(to, value.clone());
		}
		value.cloned().map_or(PropValue::Absent, PropValue::Json)
	})
}

#[test]
fn test_self_retriggering_binding_is_rejected() {
	let client = Client::new();
	client_mod::install(client.clone());
	let body = client.body();
	client.render(&echo("count"), Some(json!({"count": 1})), Target::Attach(body));
	client.render(&counted_text("count", Arc::default()), None, Target::Attach(body));

	let err = client.store().set("count", json!(2)).unwrap_err();

	assert!(matches!(err, Error::CyclicBinding { ref path, .. } if path == "count"));
	assert!(err.is_fatal());
	// The chain stops before the sibling registration.
	let sibling = client.document(|doc| doc.text_content(doc.children(body)[1]));
	assert_eq!(sibling, "1");

	// A later mutation starts a fresh chain.
	client.store().set("other", json!(true)).unwrap();
}

#[test]
fn test_mutual_retrigger_is_rejected() {
	let client = Client::new();
	client_mod::install(client.clone());
	let body = client.body();
	client.render(&forward("x", "y"), Some(json!({"x": 0, "y": 0})), Target::Attach(body));
	client.render(&forward("y", "x"), None, Target::Attach(body));

	let err = client.store().set("x", json!(1)).unwrap_err();

	assert!(matches!(err, Error::CyclicBinding { .. }));
}

#[test]
fn test_notification_depth_is_bounded() {
	let client = Client::with_options(ClientOptions {
		max_notify_depth: 1,
		..ClientOptions::default()
	});
	client_mod::install(client.clone());
	let body = client.body();
	client.render(&forward("x", "y"), Some(json!({"x": 0})), Target::Attach(body));

	let err = client.store().set("x", json!(1)).unwrap_err();

	assert!(matches!(err, Error::CyclicBinding { path, depth: 1 } if path == "y"));
}

#[test]
fn test_non_looping_reentrant_set_completes() {
	let client = Client::new();
	client_mod::install(client.clone());
	let body = client.body();
	client.render(&forward("x", "y"), Some(json!({"x": 0, "y": 0})), Target::Attach(body));
	client.render(&counted_text("y", Arc::default()), None, Target::Attach(body));

	client.store().set("x", json!(7)).unwrap();

	assert_eq!(client.store().get("y"), Some(json!(7)));
	assert_eq!(client.document(|doc| doc.text_content(doc.children(body)[1])), "7");
}
