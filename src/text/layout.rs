//! Box tree for textual output.

use super::border::Border;
use crate::infrastructure::arena::{NodeId, Tree};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Layout type of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoxType {
    /// Flows on the current line.
    #[default]
    Inline,
    /// Rectangle placed at the current column.
    InlineBlock,
    /// Separated from siblings by blank lines.
    Block,
    /// Ends with a line break.
    Line,
}

/// One node of the box tree.
#[derive(Debug, Clone)]
pub enum TextItem {
    Box {
        kind: BoxType,
        border: Option<Border>,
    },
    Text(String),
    /// Reserved position; `skipped` once its config was skipped.
    Placeholder {
        skipped: bool,
    },
}

pub(crate) type SharedTree = Rc<RefCell<Tree<TextItem>>>;

/// Handle to a node of a box tree.
#[derive(Clone)]
pub struct TextNode {
    pub(crate) tree: SharedTree,
    pub(crate) id: NodeId,
}

impl fmt::Debug for TextNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextNode").field("id", &self.id).finish()
    }
}

impl PartialEq for TextNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.tree, &other.tree) && self.id == other.id
    }
}

impl TextNode {
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    pub(crate) fn attach(&self, item: TextItem) -> Self {
        let mut tree = self.tree.borrow_mut();
        let id = tree.create(item);
        tree.append(self.id, id);
        Self {
            tree: Rc::clone(&self.tree),
            id,
        }
    }

    /// Appends literal text. Newlines start new lines.
    pub fn append_text(&self, text: &str) -> Self {
        self.attach(TextItem::Text(text.to_string()))
    }

    /// Appends a child box.
    pub fn append_box(&self, kind: BoxType) -> Self {
        self.attach(TextItem::Box { kind, border: None })
    }

    /// Sets the border of this box; ignored for non-box nodes.
    pub fn set_border(&self, border: Border) {
        if let Some(TextItem::Box { border: slot, .. }) = self.tree.borrow_mut().get_mut(self.id) {
            *slot = Some(border);
        }
    }

    /// Changes the layout type of this box.
    pub fn set_kind(&self, kind: BoxType) {
        if let Some(TextItem::Box { kind: slot, .. }) = self.tree.borrow_mut().get_mut(self.id) {
            *slot = kind;
        }
    }

    #[must_use]
    pub fn kind(&self) -> Option<BoxType> {
        match self.tree.borrow().get(self.id) {
            Some(TextItem::Box { kind, .. }) => Some(*kind),
            _ => None,
        }
    }

    #[must_use]
    pub fn item(&self) -> Option<TextItem> {
        self.tree.borrow().get(self.id).cloned()
    }

    #[must_use]
    pub fn children(&self) -> Vec<Self> {
        self.tree
            .borrow()
            .children(self.id)
            .iter()
            .map(|id| Self {
                tree: Rc::clone(&self.tree),
                id: *id,
            })
            .collect()
    }

    /// Concatenated text of the subtree, ignoring layout.
    #[must_use]
    pub fn text_content(&self) -> String {
        let tree = self.tree.borrow();
        tree.descendants(self.id)
            .into_iter()
            .filter_map(|id| match tree.get(id) {
                Some(TextItem::Text(text)) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}
