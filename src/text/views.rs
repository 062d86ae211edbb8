//! Built-in views of the text backend.

use super::{Border, BoxType, TextBackend};
use crate::config::{PropValue, RawConfig, ViewConfig};
use crate::domain::Result;
use crate::pipeline::{list_limit, ListOptions};
use crate::query::display_value;
use crate::view::{RenderCall, RenderFn, ViewDefinition, ViewOptions};
use serde_json::Value;

type Call = RenderCall<TextBackend>;

pub(super) fn builtin_views() -> Vec<ViewDefinition<TextBackend>> {
    vec![
        ViewDefinition::new("text", RenderFn::sync(render_text), ViewOptions::default()),
        ViewDefinition::new(
            "block",
            RenderFn::new(render_content),
            ViewOptions::default().box_type(BoxType::Block),
        ),
        ViewDefinition::new(
            "line",
            RenderFn::new(render_content),
            ViewOptions::default().box_type(BoxType::Line),
        ),
        ViewDefinition::new(
            "list",
            RenderFn::new(render_list),
            ViewOptions::default().box_type(BoxType::Block),
        ),
        ViewDefinition::new(
            "list-item",
            RenderFn::new(render_content),
            ViewOptions::default().box_type(BoxType::Line).border(bullet()),
        ),
        ViewDefinition::new("value", RenderFn::sync(render_value), ViewOptions::default()),
    ]
}

fn bullet() -> Border {
    Border::default().left_fn(|index, _| if index == 0 { "- ".to_string() } else { "  ".to_string() })
}

fn render_text(call: Call) -> Result<()> {
    let text = call.props.json("text").map_or_else(|| display_value(&call.data), display_value);
    call.node.append_text(&text);
    Ok(())
}

fn render_value(call: Call) -> Result<()> {
    let text = call
        .renderer
        .annotate(&call.data)
        .map_or_else(|| display_value(&call.data), |marker| marker.title);
    call.node.append_text(&text);
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
