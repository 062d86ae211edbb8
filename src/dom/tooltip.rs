//! Hover tooltips.
//!
//! A view opts in with a `tooltip` prop holding either a config, or a
//! descriptor `{ "content": <config>, "position": "pointer" | "trigger" }`.
//! Decoration only records a binding on the rendered node. The popup element
//! is created on the first hover and shared by every binding of the renderer.

use super::{DomBackend, DomNode};
use crate::config::{PropValue, RawConfig};
use crate::infrastructure::arena::{NodeId, SideTable};
use crate::pipeline::Renderer;
use futures_util::future::{self, FutureExt, LocalBoxFuture};
use serde_json::Value;

/// Where the popup is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TooltipPosition {
    #[default]
    Pointer,
    /// Next to the element carrying the binding.
    Trigger,
}

/// Pointer coordinates of a hover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pointer {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone)]
pub(crate) struct TooltipBinding {
    config: RawConfig<DomBackend>,
    data: Value,
    context: Value,
    position: TooltipPosition,
}

impl TooltipBinding {
    pub(crate) fn from_prop(prop: &PropValue<DomBackend>, data: &Value, context: &Value) -> Option<Self> {
        let (config, position) = match prop {
            PropValue::Handler(_) => return None,
            PropValue::Config(config) => (config.clone(), TooltipPosition::Pointer),
            PropValue::Json(Value::Null | Value::Bool(false)) => return None,
            PropValue::Json(Value::Object(fields)) if fields.contains_key("content") && !fields.contains_key("view") => {
                let position = match fields.get("position").and_then(Value::as_str) {
                    Some("trigger") => TooltipPosition::Trigger,
                    _ => TooltipPosition::Pointer,
                };
                (RawConfig::from(fields["content"].clone()), position)
            }
            PropValue::Json(value) => (RawConfig::from(value.clone()), TooltipPosition::Pointer),
        };
        Some(Self {
            config,
            data: data.clone(),
            context: context.clone(),
            position,
        })
    }
}

#[derive(Debug, Default)]
pub(crate) struct Tooltips {
    pub(crate) bindings: SideTable<TooltipBinding>,
    pub(crate) popup: Option<DomNode>,
}

impl Renderer<DomBackend> {
    /// Shows the tooltip of `node` or its nearest bound ancestor.
    ///
    /// Resolves with the popup once its content has rendered, or `None` when
    /// nothing under the pointer has a tooltip (the popup is hidden then).
    pub fn hover(&self, node: &DomNode, pointer: Pointer) -> LocalBoxFuture<'static, Option<DomNode>> {
        let backend = self.backend();
        let found = {
            let tooltips = backend.tooltips.borrow();
            backend
                .document()
                .lineage(node.id())
                .into_iter()
                .find_map(|id| tooltips.bindings.get(id).cloned().map(|binding| (id, binding)))
        };
        let Some((trigger, binding)) = found else {
            self.unhover();
            return future::ready(None).boxed_local();
        };

        let popup = self.popup();
        self.clear_popup(&popup);
        place(&popup, binding.position, trigger, pointer);
        tracing::debug!(trigger = trigger.get(), "showing tooltip");
        self.render(&popup, binding.config, binding.data, binding.context)
            .map(Some)
            .boxed_local()
    }

    /// Hides the shared popup, if it exists.
    pub fn unhover(&self) {
        if let Some(popup) = self.tooltip_popup() {
            self.clear_popup(&popup);
            popup.set_attribute("hidden", "");
        }
    }

    /// The shared popup, once the first hover has created it.
    #[must_use]
    pub fn tooltip_popup(&self) -> Option<DomNode> {
        self.backend().tooltips.borrow().popup.clone()
    }

    fn popup(&self) -> DomNode {
        if let Some(popup) = self.tooltip_popup() {
            return popup;
        }
        let popup = self.backend().document().body().append_element("div");
        popup.add_class(&format!("{}tooltip", self.settings().class_prefix));
        self.backend().tooltips.borrow_mut().popup = Some(popup.clone());
        popup
    }

    fn clear_popup(&self, popup: &DomNode) {
        for child in popup.children() {
            self.discard(&child);
        }
    }
}

fn place(popup: &DomNode, position: TooltipPosition, trigger: NodeId, pointer: Pointer) {
    popup.remove_attribute("hidden");
    match position {
        TooltipPosition::Pointer => {
            popup.set_attribute("data-position", "pointer");
            popup.set_attribute("style", &format!("left: {}px; top: {}px", pointer.x, pointer.y));
            popup.remove_attribute("data-anchor");
        }
        TooltipPosition::Trigger => {
            popup.set_attribute("data-position", "trigger");
            popup.set_attribute("data-anchor", &trigger.get().to_string());
            popup.remove_attribute("style");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn descriptors_pick_content_and_position() {
        let prop = PropValue::Json(json!({"content": "text", "position": "trigger"}));
        let binding = TooltipBinding::from_prop(&prop, &json!(1), &json!({})).unwrap();
        assert_eq!(binding.position, TooltipPosition::Trigger);
        assert_eq!(binding.config.to_json(), json!("text"));
    }

    #[test]
    fn plain_configs_follow_the_pointer() {
        let prop = PropValue::Json(json!({"view": "text", "content": "ignored"}));
        let binding = TooltipBinding::from_prop(&prop, &json!(1), &json!({})).unwrap();
        assert_eq!(binding.position, TooltipPosition::Pointer);
        assert!(TooltipBinding::from_prop(&PropValue::Json(json!(false)), &json!(1), &json!({})).is_none());
    }
}
