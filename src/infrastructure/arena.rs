//! Arena-backed trees and side tables keyed by stable node handles.
//!
//! Both output backends keep their nodes in a [`Tree`]. A node's [`NodeId`] is
//! assigned once at creation and never reused, so per-node metadata (render
//! provenance, placeholder state, tooltip bindings) lives in plain
//! [`SideTable`]s instead of weak maps. When a subtree is removed, the ids it
//! returns are passed to [`SideTable::forget`] so entries die with their nodes.

use std::collections::HashMap;
use std::fmt;

/// Stable handle of a node inside a [`Tree`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Raw numeric value, handy for debug output.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
struct Slot<T> {
    value: T,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Ordered tree of `T` values addressed by [`NodeId`].
///
/// Nodes are created detached and attached later, which is how render output
/// stays exclusively owned by its render call until it is spliced in.
#[derive(Debug)]
pub struct Tree<T> {
    slots: HashMap<NodeId, Slot<T>>,
    next_id: u64,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Tree<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            next_id: 1,
        }
    }

    /// Creates a detached node.
    pub fn create(&mut self, value: T) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.slots.insert(
            id,
            Slot {
                value,
                parent: None,
                children: Vec::new(),
            },
        );
        id
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.slots.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.slots.get(&id).map(|slot| &slot.value)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.slots.get_mut(&id).map(|slot| &mut slot.value)
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slots.get(&id).and_then(|slot| slot.parent)
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slots
            .get(&id)
            .map_or(&[][..], |slot| slot.children.as_slice())
    }

    /// Iterates `id`'s ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    /// Detaches `id` from its parent, keeping the subtree alive.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(slot) = self.slots.get_mut(&parent) {
            slot.children.retain(|child| *child != id);
        }
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.parent = None;
        }
    }

    /// Appends `child` as the last child of `parent`, moving it if attached.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        if !self.contains(parent) || !self.contains(child) {
            return;
        }
        self.detach(child);
        if let Some(slot) = self.slots.get_mut(&parent) {
            slot.children.push(child);
        }
        if let Some(slot) = self.slots.get_mut(&child) {
            slot.parent = Some(parent);
        }
    }

    /// Puts `replacement` where `target` sits in its parent; `target` is detached.
    ///
    /// Returns `false` when `target` has no parent, in which case nothing moves.
    pub fn replace(&mut self, target: NodeId, replacement: &[NodeId]) -> bool {
        let Some(parent) = self.parent(target) else {
            return false;
        };
        for id in replacement {
            self.detach(*id);
        }
        let Some(index) = self
            .children(parent)
            .iter()
            .position(|child| *child == target)
        else {
            return false;
        };
        if let Some(slot) = self.slots.get_mut(&parent) {
            slot.children
                .splice(index..=index, replacement.iter().copied());
        }
        for id in replacement {
            if let Some(slot) = self.slots.get_mut(id) {
                slot.parent = Some(parent);
            }
        }
        if let Some(slot) = self.slots.get_mut(&target) {
            slot.parent = None;
        }
        true
    }

    /// Removes `id` and its whole subtree, returning every removed id.
    pub fn remove(&mut self, id: NodeId) -> Vec<NodeId> {
        self.detach(id);
        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(slot) = self.slots.remove(&current) {
                stack.extend(slot.children);
                removed.push(current);
            }
        }
        removed
    }

    /// Pre-order walk of `id`'s subtree, including `id`.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.contains(current) {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }
}

/// Per-node metadata keyed by [`NodeId`].
#[derive(Debug)]
pub struct SideTable<T> {
    entries: HashMap<NodeId, T>,
}

impl<T> Default for SideTable<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> SideTable<T> {
    pub fn insert(&mut self, id: NodeId, value: T) -> Option<T> {
        self.entries.insert(id, value)
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.entries.get_mut(&id)
    }

    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        self.entries.remove(&id)
    }

    /// Drops entries of removed nodes.
    pub fn forget(&mut self, ids: &[NodeId]) {
        for id in ids {
            self.entries.remove(id);
        }
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_keeps_position() {
        let mut tree = Tree::new();
        let root = tree.create("root");
        let a = tree.create("a");
        let hole = tree.create("hole");
        let c = tree.create("c");
        for id in [a, hole, c] {
            tree.append(root, id);
        }

        let x = tree.create("x");
        let y = tree.create("y");
        assert!(tree.replace(hole, &[x, y]));

        let names: Vec<_> = tree
            .children(root)
            .iter()
            .map(|id| *tree.get(*id).unwrap())
            .collect();
        assert_eq!(names, ["a", "x", "y", "c"]);
        assert_eq!(tree.parent(hole), None);
        assert_eq!(tree.parent(y), Some(root));
    }

    #[test]
    fn remove_returns_subtree_and_side_tables_forget() {
        let mut tree = Tree::new();
        let root = tree.create(0);
        let child = tree.create(1);
        let grandchild = tree.create(2);
        tree.append(root, child);
        tree.append(child, grandchild);

        let mut table = SideTable::default();
        table.insert(grandchild, "meta");
        table.insert(root, "root-meta");

        let removed = tree.remove(child);
        assert_eq!(removed.len(), 2);
        table.forget(&removed);

        assert!(tree.children(root).is_empty());
        assert!(table.get(grandchild).is_none());
        assert_eq!(table.get(root), Some(&"root-meta"));
    }

    #[test]
    fn ids_are_never_reused() {
        let mut tree = Tree::new();
        let a = tree.create(());
        tree.remove(a);
        let b = tree.create(());
        assert_ne!(a, b);
    }
}
