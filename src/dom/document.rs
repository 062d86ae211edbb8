//! In-memory document model.
//!
//! Elements, text, comments and fragments live in one arena owned by a
//! [`Document`]. [`DomNode`] handles are cheap to clone and stay valid until
//! their subtree is removed.

use crate::infrastructure::arena::{NodeId, SideTable, Tree};
use futures_util::future::{self, FutureExt, LocalBoxFuture};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// One node of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomItem {
    Element {
        tag: String,
        classes: Vec<String>,
        attributes: BTreeMap<String, String>,
    },
    Text(String),
    Comment(String),
    /// Detached container whose children move on insertion.
    Fragment,
}

/// Click callback; the future completes once the click's effects settle.
pub type ClickHandler = Rc<dyn Fn() -> LocalBoxFuture<'static, ()>>;

struct State {
    tree: Tree<DomItem>,
    body: NodeId,
    clicks: SideTable<ClickHandler>,
}

/// Owner of a node arena with a `<body>` root.
#[derive(Clone)]
pub struct Document {
    state: Rc<RefCell<State>>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Document")
            .field("nodes", &state.tree.len())
            .field("clicks", &state.clicks.len())
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        let mut tree = Tree::new();
        let body = tree.create(element("body"));
        Self {
            state: Rc::new(RefCell::new(State {
                tree,
                body,
                clicks: SideTable::default(),
            })),
        }
    }

    #[must_use]
    pub fn body(&self) -> DomNode {
        let body = self.state.borrow().body;
        self.handle(body)
    }

    #[must_use]
    pub fn create_element(&self, tag: &str) -> DomNode {
        self.create(element(tag))
    }

    #[must_use]
    pub fn create_text(&self, text: &str) -> DomNode {
        self.create(DomItem::Text(text.to_string()))
    }

    #[must_use]
    pub fn create_comment(&self, text: &str) -> DomNode {
        self.create(DomItem::Comment(text.to_string()))
    }

    #[must_use]
    pub fn create_fragment(&self) -> DomNode {
        self.create(DomItem::Fragment)
    }

    /// Number of live nodes, detached ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.borrow().tree.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fires the click handler of `node`, if any.
    pub fn click(&self, node: &DomNode) -> LocalBoxFuture<'static, ()> {
        let handler = self.state.borrow().clicks.get(node.id).cloned();
        match handler {
            Some(handler) => handler(),
            None => future::ready(()).boxed_local(),
        }
    }

    /// Replaces `target` by `replacement` in its parent.
    ///
    /// Returns `false` when `target` is detached.
    pub(crate) fn replace(&self, target: NodeId, replacement: &[NodeId]) -> bool {
        self.state.borrow_mut().tree.replace(target, replacement)
    }

    /// Removes the subtree rooted at `id` along with its click handlers.
    pub(crate) fn remove(&self, id: NodeId) -> Vec<NodeId> {
        let mut state = self.state.borrow_mut();
        let removed = state.tree.remove(id);
        state.clicks.forget(&removed);
        removed
    }

    pub(crate) fn lineage(&self, id: NodeId) -> Vec<NodeId> {
        let state = self.state.borrow();
        std::iter::once(id).chain(state.tree.ancestors(id)).collect()
    }

    pub(crate) fn handle(&self, id: NodeId) -> DomNode {
        DomNode {
            document: self.clone(),
            id,
        }
    }

    fn create(&self, item: DomItem) -> DomNode {
        let id = self.state.borrow_mut().tree.create(item);
        self.handle(id)
    }

    fn with_item<T>(&self, id: NodeId, f: impl FnOnce(&DomItem) -> T) -> Option<T> {
        self.state.borrow().tree.get(id).map(f)
    }

    fn with_item_mut(&self, id: NodeId, f: impl FnOnce(&mut DomItem)) {
        if let Some(item) = self.state.borrow_mut().tree.get_mut(id) {
            f(item);
        }
    }
}

fn element(tag: &str) -> DomItem {
    DomItem::Element {
        tag: tag.to_string(),
        classes: Vec::new(),
        attributes: BTreeMap::new(),
    }
}

/// Handle to a node of a [`Document`].
#[derive(Clone)]
pub struct DomNode {
    document: Document,
    id: NodeId,
}

impl fmt::Debug for DomNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomNode").field("id", &self.id).finish()
    }
}

impl PartialEq for DomNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.document.state, &other.document.state) && self.id == other.id
    }
}

impl DomNode {
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Moves `child` to the end of this node. Fragments move their children.
    pub fn append(&self, child: &Self) {
        let mut state = self.document.state.borrow_mut();
        let moved: Vec<NodeId> = match state.tree.get(child.id) {
            Some(DomItem::Fragment) => state.tree.children(child.id).to_vec(),
            Some(_) => vec![child.id],
            None => return,
        };
        for id in moved {
            state.tree.append(self.id, id);
        }
    }

    pub fn append_element(&self, tag: &str) -> Self {
        let child = self.document.create_element(tag);
        self.append(&child);
        child
    }

    pub fn append_text(&self, text: &str) -> Self {
        let child = self.document.create_text(text);
        self.append(&child);
        child
    }

    pub fn append_comment(&self, text: &str) -> Self {
        let child = self.document.create_comment(text);
        self.append(&child);
        child
    }

    #[must_use]
    pub fn item(&self) -> Option<DomItem> {
        self.document.with_item(self.id, Clone::clone)
    }

    #[must_use]
    pub fn tag(&self) -> Option<String> {
        self.document.with_item(self.id, |item| match item {
            DomItem::Element { tag, .. } => Some(tag.clone()),
            _ => None,
        })?
    }

    #[must_use]
    pub fn is_fragment(&self) -> bool {
        self.document
            .with_item(self.id, |item| matches!(item, DomItem::Fragment))
            .unwrap_or(false)
    }

    #[must_use]
    pub fn is_element(&self) -> bool {
        self.document
            .with_item(self.id, |item| matches!(item, DomItem::Element { .. }))
            .unwrap_or(false)
    }

    /// Adds a class unless already present; ignored on non-elements.
    pub fn add_class(&self, class: &str) {
        if class.is_empty() {
            return;
        }
        self.document.with_item_mut(self.id, |item| {
            if let DomItem::Element { classes, .. } = item {
                if !classes.iter().any(|existing| existing == class) {
                    classes.push(class.to_string());
                }
            }
        });
    }

    #[must_use]
    pub fn classes(&self) -> Vec<String> {
        self.document
            .with_item(self.id, |item| match item {
                DomItem::Element { classes, .. } => classes.clone(),
                _ => Vec::new(),
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().iter().any(|existing| existing == class)
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        self.document.with_item_mut(self.id, |item| {
            if let DomItem::Element { attributes, .. } = item {
                attributes.insert(name.to_string(), value.to_string());
            }
        });
    }

    pub fn remove_attribute(&self, name: &str) {
        self.document.with_item_mut(self.id, |item| {
            if let DomItem::Element { attributes, .. } = item {
                attributes.remove(name);
            }
        });
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.document.with_item(self.id, |item| match item {
            DomItem::Element { attributes, .. } => attributes.get(name).cloned(),
            _ => None,
        })?
    }

    /// Rewrites the text of a text or comment node.
    pub fn set_text(&self, text: &str) {
        self.document.with_item_mut(self.id, |item| match item {
            DomItem::Text(value) | DomItem::Comment(value) => *value = text.to_string(),
            _ => {}
        });
    }

    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let parent = self.document.state.borrow().tree.parent(self.id)?;
        Some(self.document.handle(parent))
    }

    #[must_use]
    pub fn children(&self) -> Vec<Self> {
        let ids = self.document.state.borrow().tree.children(self.id).to_vec();
        ids.into_iter().map(|id| self.document.handle(id)).collect()
    }

    /// Registers an asynchronous click handler, replacing any earlier one.
    pub fn on_click<F, Fut>(&self, handler: F)
    where
        F: Fn() -> Fut + 'static,
        Fut: std::future::Future<Output = ()> + 'static,
    {
        let handler: ClickHandler = Rc::new(move || handler().boxed_local());
        self.document.state.borrow_mut().clicks.insert(self.id, handler);
    }

    /// Concatenated text of the subtree; comments are skipped.
    #[must_use]
    pub fn text_content(&self) -> String {
        let state = self.document.state.borrow();
        state
            .tree
            .descendants(self.id)
            .into_iter()
            .filter_map(|id| match state.tree.get(id) {
                Some(DomItem::Text(text)) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Serializes the subtree as HTML.
    #[must_use]
    pub fn to_html(&self) -> String {
        let state = self.document.state.borrow();
        let mut out = String::new();
        write_html(&state.tree, self.id, &mut out);
        out
    }
}

fn write_html(tree: &Tree<DomItem>, id: NodeId, out: &mut String) {
    let Some(item) = tree.get(id) else {
        return;
    };
    match item {
        DomItem::Text(text) => out.push_str(&escape(text)),
        DomItem::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        DomItem::Fragment => {
            for child in tree.children(id) {
                write_html(tree, *child, out);
            }
        }
        DomItem::Element {
            tag,
            classes,
            attributes,
        } => {
            out.push('<');
            out.push_str(tag);
            if !classes.is_empty() {
                out.push_str(&format!(" class=\"{}\"", escape(&classes.join(" "))));
            }
            for (name, value) in attributes {
                out.push_str(&format!(" {name}=\"{}\"", escape(value)));
            }
            out.push('>');
            for child in tree.children(id) {
                write_html(tree, *child, out);
            }
            out.push_str(&format!("</{tag}>"));
        }
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::Cell;

    #[test]
    fn serializes_elements_text_and_comments() {
        let document = Document::new();
        let body = document.body();
        let list = body.append_element("ul");
        list.add_class("items");
        list.set_attribute("data-count", "1");
        list.append_element("li").append_text("a < b");
        body.append_comment("skipped");
        assert_eq!(
            body.to_html(),
            "<body><ul class=\"items\" data-count=\"1\"><li>a &lt; b</li></ul><!--skipped--></body>"
        );
    }

    #[test]
    fn appending_a_fragment_moves_its_children() {
        let document = Document::new();
        let fragment = document.create_fragment();
        fragment.append_text("x");
        fragment.append_text("y");
        document.body().append(&fragment);
        assert_eq!(document.body().children().len(), 2);
        assert!(fragment.children().is_empty());
        assert_eq!(document.body().text_content(), "xy");
    }

    #[test]
    fn click_runs_the_handler_until_removed() {
        let document = Document::new();
        let button = document.body().append_element("button");
        let clicks = Rc::new(Cell::new(0));
        let counter = Rc::clone(&clicks);
        button.on_click(move || {
            counter.set(counter.get() + 1);
            async {}
        });
        block_on(document.click(&button));
        document.remove(button.id());
        block_on(document.click(&button));
        assert_eq!(clicks.get(), 1);
    }
}
