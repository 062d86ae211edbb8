//! Built-in views of the DOM backend.

use super::DomBackend;
use crate::config::{PropValue, RawConfig, ViewConfig};
use crate::domain::Result;
use crate::pipeline::{list_limit, ListOptions};
use crate::query::display_value;
use crate::view::{RenderCall, RenderFn, ViewDefinition, ViewOptions};
use serde_json::Value;

type Call = RenderCall<DomBackend>;

pub(super) fn builtin_views() -> Vec<ViewDefinition<DomBackend>> {
    vec![
        ViewDefinition::new("text", RenderFn::sync(render_text), ViewOptions::default().fragment()),
        ViewDefinition::new("block", RenderFn::new(render_content), ViewOptions::default()),
        ViewDefinition::new("line", RenderFn::new(render_content), ViewOptions::default()),
        ViewDefinition::new("list", RenderFn::new(render_list), ViewOptions::default().tag("ul")),
        ViewDefinition::new("list-item", RenderFn::new(render_content), ViewOptions::default().tag("li")),
        ViewDefinition::new("value", RenderFn::sync(render_value), ViewOptions::default().fragment()),
        ViewDefinition::new("button", RenderFn::sync(render_button), ViewOptions::default().tag("button")),
    ]
}

fn label(call: &Call) -> String {
    call.props.json("text").map_or_else(|| display_value(&call.data), display_value)
}

fn render_text(call: Call) -> Result<()> {
    call.node.append_text(&label(&call));
    Ok(())
}

fn render_value(call: Call) -> Result<()> {
    match call.renderer.annotate(&call.data) {
        Some(marker) => {
            let link = call.node.append_element("a");
            link.add_class(&format!("{}marker", call.renderer.settings().class_prefix));
            link.set_attribute("data-type", &marker.kind);
            if let Some(href) = &marker.href {
                link.set_attribute("href", href);
            }
            link.append_text(&marker.title);
        }
        None => {
            call.node.append_text(&display_value(&call.data));
        }
    }
    Ok(())
}

/// Calls the `onClick` handler prop with the view's data and context.
fn render_button(call: Call) -> Result<()> {
    call.node.append_text(&label(&call));
    if let Some(handler) = call.props.handler("onClick").cloned() {
        let (data, context) = (call.data, call.context);
        call.node.on_click(move || {
            handler.call(&data, &context);
            async {}
        });
    }
    Ok(())
}

async fn render_content(call: Call) -> Result<()> {
    if let Some(content) = call.props.config("content") {
        call.renderer
            .render_item(&call.node, content, call.data, call.context, call.item)
            .await;
    }
    Ok(())
}

async fn render_list(call: Call) -> Result<()> {
    let RenderCall {
        renderer,
        node,
        props,
        data,
        context,
        ..
    } = call;
    let Value::Array(items) = data else {
        return Ok(());
    };
    let item = props.config("item").unwrap_or_else(|| RawConfig::from("text"));
    let item_config = ViewConfig::named("list-item").with_prop("content", PropValue::Config(item));
    let limit = list_limit(props.json("limit"), renderer.settings().default_list_limit);
    renderer
        .render_list(&node, item_config, items, context, ListOptions::limit(limit))
        .await;
    Ok(())
}
