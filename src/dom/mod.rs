//! DOM backend.
//!
//! Placeholders are comment nodes. A view renders into a fresh element (or a
//! fragment when its options say so), which replaces the placeholder once the
//! view has finished. Fragment children are placed individually and each one
//! carries the provenance of the config that produced it.
//!
//! ```
//! use dashview::dom::{DomBackend, DomRenderer};
//! use futures::executor::block_on;
//! use serde_json::json;
//!
//! let backend = DomBackend::new();
//! let renderer = DomRenderer::builder(backend.clone()).build();
//! let body = backend.document().body();
//! block_on(renderer.render(&body, json!("block{content: \"text\"}"), json!("hi"), json!({})));
//! assert_eq!(body.to_html(), "<body><div class=\"view-block\">hi</div></body>");
//! ```

mod document;
mod tooltip;
mod views;

pub use document::{ClickHandler, Document, DomItem, DomNode};
pub use tooltip::{Pointer, TooltipPosition};

use crate::domain::DashviewError;
use crate::infrastructure::arena::NodeId;
use crate::pipeline::{Backend, Decoration, ListContinuation, Renderer};
use crate::view::{Tag, ViewDefinition, ViewOptions};
use serde_json::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tooltip::{TooltipBinding, Tooltips};

/// Renderer producing DOM nodes.
pub type DomRenderer = Renderer<DomBackend>;

/// Backend writing into a [`Document`].
#[derive(Clone, Default)]
pub struct DomBackend {
    document: Document,
    tooltips: Rc<RefCell<Tooltips>>,
}

impl fmt::Debug for DomBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomBackend")
            .field("document", &self.document)
            .field("tooltips", &self.tooltips.borrow().bindings.len())
            .finish()
    }
}

impl DomBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend over an existing document.
    #[must_use]
    pub fn with_document(document: Document) -> Self {
        Self {
            document,
            tooltips: Rc::default(),
        }
    }

    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Fires the click handler of `node`.
    pub fn click(&self, node: &DomNode) -> futures_util::future::LocalBoxFuture<'static, ()> {
        self.document.click(node)
    }

    /// Whether `node` carries a tooltip binding.
    #[must_use]
    pub fn has_tooltip(&self, node: &DomNode) -> bool {
        self.tooltips.borrow().bindings.get(node.id()).is_some()
    }
}

impl Backend for DomBackend {
    type Node = DomNode;

    fn node_id(node: &DomNode) -> NodeId {
        node.id()
    }

    fn reserve(&self, parent: &DomNode) -> DomNode {
        parent.append_comment("view")
    }

    fn mark_skipped(&self, placeholder: &DomNode) {
        placeholder.set_text("skipped");
    }

    fn create(&self, options: &ViewOptions<Self>) -> DomNode {
        match &options.tag {
            Tag::Element(tag) => self.document.create_element(tag),
            Tag::Fragment => self.document.create_fragment(),
        }
    }

    fn splice(&self, placeholder: &DomNode, output: &DomNode) -> Vec<NodeId> {
        let placed: Vec<NodeId> = if output.is_fragment() {
            output.children().iter().map(DomNode::id).collect()
        } else {
            vec![output.id()]
        };
        if self.document.replace(placeholder.id(), &placed) {
            self.remove(placeholder);
            if output.is_fragment() {
                self.remove(output);
            }
            placed
        } else {
            // Container was discarded while the view was rendering.
            self.remove(output);
            Vec::new()
        }
    }

    fn render_failure(&self, error: &DashviewError, offending: Option<&Value>) -> DomNode {
        let node = self.document.create_element("div");
        node.add_class("render-error");
        node.set_attribute("data-kind", error.kind());
        node.append_text(&error.to_string());
        if let Some(offending) = offending {
            let source = serde_json::to_string_pretty(offending).unwrap_or_else(|_| offending.to_string());
            node.append_element("pre").append_text(&source);
        }
        node
    }

    fn decorate(&self, output: &DomNode, decoration: &Decoration<'_, Self>) {
        let targets = if output.is_fragment() {
            output.children()
        } else {
            if let Some(view) = decoration.view {
                output.add_class(&format!("{}{view}", decoration.settings.class_prefix));
            }
            for class in decoration.classes {
                output.add_class(class);
            }
            vec![output.clone()]
        };

        let Some(prop) = decoration.props.get("tooltip") else {
            return;
        };
        let Some(binding) = TooltipBinding::from_prop(prop, decoration.data, decoration.context) else {
            return;
        };
        let mut tooltips = self.tooltips.borrow_mut();
        for target in targets.iter().filter(|target| target.is_element()) {
            tooltips.bindings.insert(target.id(), binding.clone());
        }
    }

    fn remove(&self, node: &DomNode) -> Vec<NodeId> {
        let removed = self.document.remove(node.id());
        let mut tooltips = self.tooltips.borrow_mut();
        tooltips.bindings.forget(&removed);
        if tooltips.popup.as_ref().is_some_and(|popup| removed.contains(&popup.id())) {
            tooltips.popup = None;
        }
        removed
    }

    fn lineage(&self, node: &DomNode) -> Vec<NodeId> {
        self.document.lineage(node.id())
    }

    fn render_more(renderer: &Renderer<Self>, container: &DomNode, more: ListContinuation<Self>) {
        let target = more.more_container.clone().unwrap_or_else(|| container.clone());
        let wrapper = target.append_element("div");
        wrapper.add_class(&format!("{}more-buttons", renderer.settings().class_prefix));

        let next = more.next_page();
        if next < more.remaining {
            more_button(renderer, &wrapper, container, &more, &format!("Show {next} more…"), false);
        }
        let label = format!("Show all {} remaining…", more.remaining);
        more_button(renderer, &wrapper, container, &more, &label, true);
    }

    fn check_options(options: &ViewOptions<Self>) -> Vec<String> {
        match &options.tag {
            Tag::Element(tag) if tag.is_empty() => vec!["empty tag name".to_string()],
            Tag::Element(tag) if tag.chars().any(char::is_whitespace) => {
                vec![format!("tag `{tag}` contains whitespace")]
            }
            _ => Vec::new(),
        }
    }

    fn builtin_views() -> Vec<ViewDefinition<Self>> {
        views::builtin_views()
    }
}

/// Appends a button that removes `wrapper` and renders the next page.
///
/// Handlers are stored inside the document, so they hold ids and a weak
/// renderer instead of node handles.
fn more_button(
    renderer: &Renderer<DomBackend>,
    wrapper: &DomNode,
    container: &DomNode,
    more: &ListContinuation<DomBackend>,
    label: &str,
    all: bool,
) {
    let button = wrapper.append_element("button");
    button.append_text(label);

    let weak = renderer.downgrade();
    let wrapper_id = wrapper.id();
    let container_id = container.id();
    let more_container_id = more.more_container.as_ref().map(DomNode::id);
    let mut detached = more.clone();
    detached.more_container = None;

    button.on_click(move || {
        let renderer = weak.upgrade();
        let mut more = detached.clone();
        async move {
            let Some(renderer) = renderer else {
                return;
            };
            let document = renderer.backend().document().clone();
            renderer.discard(&document.handle(wrapper_id));
            more.more_container = more_container_id.map(|id| document.handle(id));
            tracing::debug!(offset = more.offset, all, "rendering more list items");
            more.render_next(&renderer, &document.handle(container_id), all).await;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;
    use crate::view::{RenderCall, RenderFn};
    use futures::executor::block_on;
    use serde_json::json;

    fn setup() -> (DomBackend, DomRenderer, DomNode) {
        let backend = DomBackend::new();
        let renderer = DomRenderer::builder(backend.clone()).build();
        let body = backend.document().body();
        (backend, renderer, body)
    }

    #[test]
    fn skipped_views_leave_a_comment() {
        let (_, renderer, body) = setup();
        let config = ViewConfig::named("text").with_when("false");
        block_on(renderer.render(&body, config, json!(1), json!({})));
        assert_eq!(body.to_html(), "<body><!--skipped--></body>");
    }

    #[test]
    fn classes_come_from_view_name_and_class_name() {
        let (_, renderer, body) = setup();
        let config = ViewConfig::named("block").with_class(json!("wide"));
        block_on(renderer.render(&body, config, json!(null), json!({})));
        let block = &body.children()[0];
        assert_eq!(block.classes(), ["view-block", "wide"]);
    }

    #[test]
    fn fragment_children_are_spliced_in_place() {
        let (_, renderer, body) = setup();
        renderer
            .define(
                "pair",
                RenderFn::sync(|call: RenderCall<DomBackend>| {
                    call.node.append_element("b").append_text("1");
                    call.node.append_element("i").append_text("2");
                    Ok(())
                }),
                ViewOptions::default().fragment(),
            )
            .unwrap();
        block_on(renderer.render(&body, json!(["pair", "text:\"!\""]), json!(null), json!({})));
        assert_eq!(body.to_html(), "<body><b>1</b><i>2</i>!</body>");
        let provenance = renderer.provenance_of(&body.children()[1]).unwrap();
        assert_eq!(provenance.view.as_deref(), Some("pair"));
    }

    #[test]
    fn failures_render_in_place() {
        let (_, renderer, body) = setup();
        block_on(renderer.render(&body, json!(["text:\"a\"", "missing", "text:\"b\""]), json!(null), json!({})));
        let children = body.children();
        assert_eq!(children.len(), 3);
        assert!(children[1].has_class("render-error"));
        assert_eq!(children[1].attribute("data-kind").as_deref(), Some("lookup"));
        assert_eq!(children[2].text_content(), "b");
    }

    #[test]
    fn whitespace_tags_are_reported() {
        let options: ViewOptions<DomBackend> = ViewOptions::default().tag("my tag");
        assert_eq!(DomBackend::check_options(&options).len(), 1);
    }
}
