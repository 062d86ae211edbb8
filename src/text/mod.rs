//! Text/box backend.
//!
//! Views render into boxes typed `inline`, `inline-block`, `block` or `line`.
//! The tree is only turned into text when [`TextBackend::serialize`] is called,
//! after every render has settled.
//!
//! ```
//! use dashview::text::{BoxType, TextBackend, TextRenderer};
//! use futures::executor::block_on;
//! use serde_json::json;
//!
//! let backend = TextBackend::new();
//! let renderer = TextRenderer::builder(backend.clone()).build();
//! let root = backend.root(BoxType::Block);
//! block_on(renderer.render(&root, json!(["text:\"hello\"", "text:\"world\""]), json!(null), json!({})));
//! assert_eq!(backend.serialize(&root), "helloworld");
//! ```

mod border;
mod layout;
mod serialize;
mod views;

pub use border::{Border, EdgeBorder, SideBorder};
pub use layout::{BoxType, TextItem, TextNode};

use crate::domain::DashviewError;
use crate::infrastructure::arena::{NodeId, Tree};
use crate::pipeline::{Backend, Decoration, ListContinuation, Renderer};
use crate::view::{ViewDefinition, ViewOptions};
use layout::SharedTree;
use serde_json::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Renderer producing text.
pub type TextRenderer = Renderer<TextBackend>;

/// Owner of a box tree.
#[derive(Clone, Default)]
pub struct TextBackend {
    tree: SharedTree,
}

impl fmt::Debug for TextBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextBackend")
            .field("nodes", &self.tree.borrow().len())
            .finish()
    }
}

impl TextBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: Rc::new(RefCell::new(Tree::new())),
        }
    }

    /// Creates a detached box to render into.
    #[must_use]
    pub fn root(&self, kind: BoxType) -> TextNode {
        self.detached(TextItem::Box { kind, border: None })
    }

    /// Text of the subtree rooted at `node`.
    #[must_use]
    pub fn serialize(&self, node: &TextNode) -> String {
        self.lines(node).join("\n")
    }

    #[must_use]
    pub fn lines(&self, node: &TextNode) -> Vec<String> {
        serialize::lines(&self.tree.borrow(), node.id)
    }

    /// Number of live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.tree.borrow().len()
    }

    fn detached(&self, item: TextItem) -> TextNode {
        let id = self.tree.borrow_mut().create(item);
        TextNode {
            tree: Rc::clone(&self.tree),
            id,
        }
    }
}

impl Backend for TextBackend {
    type Node = TextNode;

    fn node_id(node: &TextNode) -> NodeId {
        node.id
    }

    fn reserve(&self, parent: &TextNode) -> TextNode {
        parent.attach(TextItem::Placeholder { skipped: false })
    }

    fn mark_skipped(&self, placeholder: &TextNode) {
        if let Some(TextItem::Placeholder { skipped }) = self.tree.borrow_mut().get_mut(placeholder.id) {
            *skipped = true;
        }
    }

    fn create(&self, options: &ViewOptions<Self>) -> TextNode {
        let kind = match (options.box_type, &options.border) {
            (BoxType::Inline, Some(_)) => BoxType::InlineBlock,
            (kind, _) => kind,
        };
        self.detached(TextItem::Box {
            kind,
            border: options.border.clone(),
        })
    }

    fn splice(&self, placeholder: &TextNode, output: &TextNode) -> Vec<NodeId> {
        let mut tree = self.tree.borrow_mut();
        if tree.replace(placeholder.id, &[output.id]) {
            tree.remove(placeholder.id);
            vec![output.id]
        } else {
            // Container was discarded while the view was rendering.
            tree.remove(output.id);
            Vec::new()
        }
    }

    fn render_failure(&self, error: &DashviewError, offending: Option<&Value>) -> TextNode {
        let node = self.detached(TextItem::Box {
            kind: BoxType::Line,
            border: None,
        });
        let mut message = format!("[{}] {error}", error.kind());
        if let Some(offending) = offending {
            message.push_str(&format!(" in {offending}"));
        }
        node.append_text(&message);
        node
    }

    fn decorate(&self, _output: &TextNode, _decoration: &Decoration<'_, Self>) {}

    fn remove(&self, node: &TextNode) -> Vec<NodeId> {
        self.tree.borrow_mut().remove(node.id)
    }

    fn lineage(&self, node: &TextNode) -> Vec<NodeId> {
        let tree = self.tree.borrow();
        std::iter::once(node.id).chain(tree.ancestors(node.id)).collect()
    }

    fn render_more(_renderer: &Renderer<Self>, container: &TextNode, more: ListContinuation<Self>) {
        let target = more.more_container.as_ref().unwrap_or(container);
        target
            .append_box(BoxType::Line)
            .append_text(&format!("({} more…)", more.remaining));
    }

    fn check_options(options: &ViewOptions<Self>) -> Vec<String> {
        if options.box_type == BoxType::Inline && options.border.is_some() {
            vec!["border on an inline view; laid out as inline-block".to_string()]
        } else {
            Vec::new()
        }
    }

    fn builtin_views() -> Vec<ViewDefinition<Self>> {
        views::builtin_views()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;
    use crate::view::{RenderCall, RenderFn};
    use futures::executor::block_on;
    use serde_json::json;

    fn setup() -> (TextBackend, TextRenderer, TextNode) {
        let backend = TextBackend::new();
        let renderer = TextRenderer::builder(backend.clone()).build();
        let root = backend.root(BoxType::Block);
        (backend, renderer, root)
    }

    #[test]
    fn block_view_renders_nested_content() {
        let (backend, renderer, root) = setup();
        let content = json!([
            {"view": "line", "content": "text:\"a\""},
            {"view": "line", "content": "text:\"b\""},
        ]);
        let config = ViewConfig::named("block").with_prop("content", content);
        block_on(renderer.render(&root, config, json!(null), json!({})));
        assert_eq!(backend.serialize(&root), "a\nb");
    }

    #[test]
    fn list_items_get_bullets() {
        let (backend, renderer, root) = setup();
        block_on(renderer.render(&root, json!("list"), json!(["x", "y"]), json!({})));
        assert_eq!(backend.serialize(&root), "- x\n- y");
    }

    #[test]
    fn long_lists_end_with_a_more_marker() {
        let (backend, renderer, root) = setup();
        let items: Vec<_> = (0..5).map(|n| json!(n)).collect();
        block_on(renderer.render(&root, json!({"view": "list", "limit": 2}), json!(items), json!({})));
        assert_eq!(backend.serialize(&root), "- 0\n- 1\n(3 more…)");
    }

    #[test]
    fn unknown_views_render_an_inline_error() {
        let (backend, renderer, root) = setup();
        block_on(renderer.render(&root, json!("nope"), json!(null), json!({})));
        assert_eq!(backend.serialize(&root), r#"[lookup] View `nope` is not found in {"view":"nope"}"#);
    }

    #[test]
    fn inline_border_becomes_inline_block() {
        let (backend, renderer, root) = setup();
        renderer
            .define(
                "quote",
                RenderFn::sync(|call: RenderCall<TextBackend>| {
                    call.node.append_text("a\nb");
                    Ok(())
                }),
                ViewOptions::default().border(Border::default().left("> ")),
            )
            .unwrap();
        block_on(renderer.render(&root, json!(["text:\"x\"", "quote"]), json!(null), json!({})));
        assert_eq!(backend.serialize(&root), "x> a\n > b");
    }

    #[test]
    fn discarded_output_frees_its_nodes() {
        let (backend, renderer, root) = setup();
        block_on(renderer.render(&root, json!("text:\"gone\""), json!(null), json!({})));
        let before = backend.node_count();
        let child = root.children()[0].clone();
        renderer.discard(&child);
        assert!(backend.node_count() < before);
        assert_eq!(backend.serialize(&root), "");
    }
}
