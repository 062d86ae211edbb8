//! DOM backend: lists with "show more" buttons, tooltips, annotations.

use dashview::dom::{DomBackend, DomNode, DomRenderer, Pointer};
use dashview::pipeline::ListOptions;
use dashview::{DashviewError, FnLookup, Handler, Marker, PropValue, RenderCall, RenderFn, ViewConfig, ViewOptions};
use futures::executor::block_on;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::Rc;

fn setup() -> (DomBackend, DomRenderer, DomNode) {
    let backend = DomBackend::new();
    let renderer = DomRenderer::builder(backend.clone()).build();
    let body = backend.document().body();
    (backend, renderer, body)
}

fn buttons(node: &DomNode) -> Vec<DomNode> {
    let mut found = Vec::new();
    for child in node.children() {
        if child.tag().as_deref() == Some("button") {
            found.push(child.clone());
        }
        found.extend(buttons(&child));
    }
    found
}

fn items(node: &DomNode) -> usize {
    node.children()
        .iter()
        .filter(|child| child.tag().as_deref() == Some("li"))
        .count()
}

#[test]
fn show_all_renders_the_rest_without_more_buttons() {
    let (backend, renderer, body) = setup();
    let list = body.append_element("ul");
    let data: Vec<Value> = (0..30).map(|n| json!(n)).collect();
    let item = ViewConfig::named("list-item").with_prop("content", json!("text"));

    block_on(renderer.render_list(&list, item, data, json!({}), ListOptions::limit(Some(10))));
    assert_eq!(items(&list), 10);
    let labels: Vec<String> = buttons(&list).iter().map(DomNode::text_content).collect();
    assert_eq!(labels, ["Show 10 more…", "Show all 20 remaining…"]);

    let show_all = buttons(&list).pop().unwrap();
    block_on(backend.click(&show_all));
    assert_eq!(items(&list), 30);
    assert!(buttons(&list).is_empty());
    assert_eq!(list.children().last().unwrap().text_content(), "29");
}

#[test]
fn show_more_renders_one_page_at_a_time() {
    let (backend, renderer, body) = setup();
    let data: Vec<Value> = (0..25).map(|n| json!(n)).collect();
    block_on(renderer.render(&body, json!({"view": "list", "limit": 10}), json!(data), json!({})));
    let list = body.children()[0].clone();
    assert_eq!(list.tag().as_deref(), Some("ul"));

    let next = buttons(&list).remove(0);
    block_on(backend.click(&next));
    assert_eq!(items(&list), 20);
    let labels: Vec<String> = buttons(&list).iter().map(DomNode::text_content).collect();
    assert_eq!(labels, ["Show all 5 remaining…"]);
}

#[test]
fn more_buttons_go_to_the_requested_container() {
    let (_, renderer, body) = setup();
    let list = body.append_element("ul");
    let footer = body.append_element("div");
    let options = ListOptions {
        limit: Some(1),
        more_container: Some(footer.clone()),
        ..ListOptions::default()
    };
    block_on(renderer.render_list(&list, "text", vec![json!("a"), json!("b")], json!({}), options));
    assert!(buttons(&list).is_empty());
    assert_eq!(buttons(&footer).len(), 1);
}

#[test]
fn item_context_carries_indexes() {
    let (_, renderer, body) = setup();
    let data = vec![json!("a"), json!("b"), json!("c")];
    let options = ListOptions {
        offset: 1,
        ..ListOptions::default()
    };
    block_on(renderer.render_list(&body, "text:#.index", data, json!({}), options));
    assert_eq!(body.text_content(), "12");
}

#[test]
fn tooltips_share_one_lazily_created_popup() {
    let (backend, renderer, body) = setup();
    let config = json!([
        {"view": "block", "content": "text", "tooltip": "text:\"first tip\""},
        {"view": "block", "content": "text", "tooltip": {"content": "text:\"second tip\"", "position": "trigger"}},
    ]);
    block_on(renderer.render(&body, config, json!("label"), json!({})));
    assert!(renderer.tooltip_popup().is_none());

    let first = body.children()[0].clone();
    let second = body.children()[1].clone();
    assert!(backend.has_tooltip(&first));

    let label = first.children()[0].clone();
    let popup = block_on(renderer.hover(&label, Pointer { x: 4, y: 8 })).unwrap();
    assert_eq!(popup.text_content(), "first tip");
    assert_eq!(popup.attribute("style").as_deref(), Some("left: 4px; top: 8px"));

    let again = block_on(renderer.hover(&second, Pointer::default())).unwrap();
    assert_eq!(again, popup);
    assert_eq!(popup.text_content(), "second tip");
    assert_eq!(popup.attribute("data-position").as_deref(), Some("trigger"));
    assert_eq!(popup.attribute("data-anchor"), Some(second.id().get().to_string()));

    let popups = body.children().iter().filter(|child| child.has_class("view-tooltip")).count();
    assert_eq!(popups, 1);

    assert!(block_on(renderer.hover(&body, Pointer::default())).is_none());
    assert_eq!(popup.attribute("hidden").as_deref(), Some(""));
    assert_eq!(popup.text_content(), "");
}

#[test]
fn values_are_annotated_through_the_lookup() {
    let backend = DomBackend::new();
    let renderer = DomRenderer::builder(backend.clone())
        .lookup(FnLookup(|value: &Value| {
            value.get("pkg").and_then(Value::as_str).map(|name| Marker {
                kind: "package".into(),
                title: name.into(),
                href: Some(format!("#package:{name}")),
            })
        }))
        .build();
    let body = backend.document().body();
    block_on(renderer.render(&body, json!(["value", "value:plain"]), json!({"pkg": "toml", "plain": 7}), json!({})));
    assert_eq!(
        body.to_html(),
        "<body><a class=\"view-marker\" data-type=\"package\" href=\"#package:toml\">toml</a>7</body>"
    );
}

#[test]
fn buttons_call_their_handler_with_data() {
    let (backend, renderer, body) = setup();
    let clicked = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&clicked);
    let config = ViewConfig::named("button")
        .with_prop("text", "Open")
        .with_prop("onClick", PropValue::Handler(Handler::new(move |data, _| sink.borrow_mut().push(data.clone()))));
    block_on(renderer.render(&body, config, json!({"id": 1}), json!({})));

    let button = body.children()[0].clone();
    assert_eq!(button.to_html(), "<button class=\"view-button\">Open</button>");
    block_on(backend.click(&button));
    assert_eq!(*clicked.borrow(), [json!({"id": 1})]);
}

#[test]
fn async_views_splice_into_comment_placeholders() {
    let (_, renderer, body) = setup();
    renderer
        .define(
            "later",
            RenderFn::new(|call: RenderCall<DomBackend>| async move {
                call.node.append_text("done");
                Ok::<_, DashviewError>(())
            }),
            ViewOptions::default().tag("span"),
        )
        .unwrap();
    let render = renderer.render(&body, json!(["later", "text:\"!\""]), json!(null), json!({}));
    assert_eq!(body.to_html(), "<body><!--view--><!--view--></body>");
    block_on(render);
    assert_eq!(body.to_html(), "<body><span class=\"view-later\">done</span>!</body>");
}

#[test]
fn class_prefix_comes_from_settings() {
    let backend = DomBackend::new();
    let settings = dashview::Settings {
        class_prefix: "dv-".to_string(),
        ..dashview::Settings::default()
    };
    let renderer = DomRenderer::builder(backend.clone()).settings(settings).build();
    let body = backend.document().body();
    block_on(renderer.render(&body, "block", json!(null), json!({})));
    assert_eq!(body.children()[0].classes(), ["dv-block"]);
}
