//! Box tree to text lines.
//!
//! Two passes over a snapshot of the tree:
//!
//! 1. cleanup drops empty text, unresolved placeholders and empty boxes, then
//!    collapses single-child wrappers that add nothing to the layout;
//! 2. emission walks the cleaned tree depth first, feeding a [`Writer`] that
//!    tracks the current line and the strongest break requested since the last
//!    piece of content.
//!
//! There is no measurement pass and no wrapping: widths are terminal cells.
//! A bordered line is drawn as a rectangle at the current column, so it breaks
//! where an unbordered line would and continues its later rows indented.

use super::border::{width, Border};
use super::layout::{BoxType, TextItem};
use crate::infrastructure::arena::{NodeId, Tree};
use std::cmp::Ordering;

#[derive(Debug, Clone)]
enum Layout {
    Text(String),
    Box {
        kind: BoxType,
        border: Option<Border>,
        children: Vec<Layout>,
    },
}

fn clean(tree: &Tree<TextItem>, id: NodeId) -> Option<Layout> {
    match tree.get(id)? {
        TextItem::Text(text) if text.is_empty() => None,
        TextItem::Text(text) => Some(Layout::Text(text.clone())),
        TextItem::Placeholder { .. } => None,
        TextItem::Box { kind, border } => {
            let mut children: Vec<Layout> = tree.children(id).iter().filter_map(|child| clean(tree, *child)).collect();
            if children.is_empty() {
                return None;
            }
            if children.len() == 1 {
                let collapse = match &children[0] {
                    _ if *kind == BoxType::Inline && border.is_none() => true,
                    Layout::Box { kind: child_kind, .. } => child_kind == kind && border.is_none(),
                    Layout::Text(_) => false,
                };
                if collapse {
                    return children.pop();
                }
            }
            Some(Layout::Box {
                kind: *kind,
                border: border.clone(),
                children,
            })
        }
    }
}

/// Pending separation before the next piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Break {
    None,
    Line,
    Blank,
}

struct Writer {
    lines: Vec<String>,
    pending: Break,
}

impl Writer {
    fn new() -> Self {
        Self {
            lines: vec![String::new()],
            pending: Break::None,
        }
    }

    fn has_content(&self) -> bool {
        self.lines.len() > 1 || !self.lines[0].is_empty()
    }

    fn current(&mut self) -> &mut String {
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
        let last = self.lines.len() - 1;
        &mut self.lines[last]
    }

    /// Breaks requested before any content are dropped.
    fn request(&mut self, request: Break) {
        if self.has_content() && request.cmp(&self.pending) == Ordering::Greater {
            self.pending = request;
        }
    }

    fn flush(&mut self) {
        let pending = std::mem::replace(&mut self.pending, Break::None);
        if pending == Break::None {
            return;
        }
        if !self.current().is_empty() {
            self.lines.push(String::new());
        }
        if pending == Break::Blank {
            let count = self.lines.len();
            if count >= 2 && !self.lines[count - 2].is_empty() {
                self.lines.push(String::new());
            }
        }
    }

    /// Inline text; embedded newlines continue at column zero.
    fn text(&mut self, text: &str) {
        self.flush();
        let mut parts = text.split('\n');
        if let Some(first) = parts.next() {
            self.current().push_str(first);
        }
        for part in parts {
            self.lines.push(part.to_string());
        }
    }

    /// Rectangle at the current column; later rows are indented to it.
    fn place(&mut self, block: &[String]) {
        let Some((first, rest)) = block.split_first() else {
            return;
        };
        self.flush();
        let column = width(self.current());
        self.current().push_str(first);
        let indent = " ".repeat(column);
        for line in rest {
            self.lines.push(format!("{indent}{line}"));
        }
    }

    /// Rows on lines of their own.
    fn rows(&mut self, block: &[String]) {
        if block.is_empty() {
            return;
        }
        self.request(Break::Line);
        self.flush();
        self.current().push_str(&block[0]);
        self.lines.extend(block[1..].iter().cloned());
        self.request(Break::Line);
    }

    fn finish(mut self) -> Vec<String> {
        while self.lines.len() > 1 && self.lines.last().is_some_and(String::is_empty) {
            self.lines.pop();
        }
        if self.lines.len() == 1 && self.lines[0].is_empty() {
            self.lines.clear();
        }
        self.lines
    }
}

fn emit(writer: &mut Writer, node: &Layout) {
    match node {
        Layout::Text(text) => writer.text(text),
        Layout::Box { kind, border, children } => match (kind, border) {
            (BoxType::Inline, None) => emit_all(writer, children),
            (BoxType::Block, None) => {
                writer.request(Break::Blank);
                emit_all(writer, children);
                writer.request(Break::Blank);
            }
            (BoxType::Line, None) => {
                emit_all(writer, children);
                writer.request(Break::Line);
            }
            (BoxType::Inline | BoxType::InlineBlock, border) => {
                writer.place(&rectangle(children, border.as_ref()));
            }
            (BoxType::Block, Some(border)) => {
                writer.request(Break::Blank);
                writer.rows(&rectangle(children, Some(border)));
                writer.request(Break::Blank);
            }
            (BoxType::Line, Some(border)) => {
                writer.place(&rectangle(children, Some(border)));
                writer.request(Break::Line);
            }
        },
    }
}

fn emit_all(writer: &mut Writer, children: &[Layout]) {
    for child in children {
        emit(writer, child);
    }
}

fn rectangle(children: &[Layout], border: Option<&Border>) -> Vec<String> {
    let mut inner = Writer::new();
    emit_all(&mut inner, children);
    let lines = inner.finish();
    match border {
        Some(border) => border.apply(&lines),
        None => lines,
    }
}

/// Lines of the subtree rooted at `id`.
pub(crate) fn lines(tree: &Tree<TextItem>, id: NodeId) -> Vec<String> {
    let Some(root) = clean(tree, id) else {
        return Vec::new();
    };
    let mut writer = Writer::new();
    emit(&mut writer, &root);
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Build {
        tree: Tree<TextItem>,
        root: NodeId,
    }

    impl Build {
        fn new() -> Self {
            let mut tree = Tree::new();
            let root = tree.create(TextItem::Box {
                kind: BoxType::Block,
                border: None,
            });
            Self { tree, root }
        }

        fn boxed(&mut self, parent: NodeId, kind: BoxType) -> NodeId {
            let id = self.tree.create(TextItem::Box { kind, border: None });
            self.tree.append(parent, id);
            id
        }

        fn bordered(&mut self, parent: NodeId, kind: BoxType, border: Border) -> NodeId {
            let id = self.tree.create(TextItem::Box {
                kind,
                border: Some(border),
            });
            self.tree.append(parent, id);
            id
        }

        fn text(&mut self, parent: NodeId, text: &str) {
            let id = self.tree.create(TextItem::Text(text.to_string()));
            self.tree.append(parent, id);
        }

        fn render(&self) -> String {
            lines(&self.tree, self.root).join("\n")
        }
    }

    #[test]
    fn blocks_are_separated_by_one_blank_line() {
        let mut b = Build::new();
        let first = b.boxed(b.root, BoxType::Block);
        b.text(first, "one\ntwo");
        let second = b.boxed(b.root, BoxType::Block);
        b.text(second, "three");
        assert_eq!(b.render(), "one\ntwo\n\nthree");
    }

    #[test]
    fn trailing_block_adds_no_trailing_blank_line() {
        let mut b = Build::new();
        b.text(b.root, "lead");
        let block = b.boxed(b.root, BoxType::Block);
        b.text(block, "one\ntwo");
        assert_eq!(b.render(), "lead\n\none\ntwo");
    }

    #[test]
    fn lines_break_without_blank_lines() {
        let mut b = Build::new();
        for text in ["a", "b"] {
            let line = b.boxed(b.root, BoxType::Line);
            b.text(line, text);
        }
        b.text(b.root, "c");
        assert_eq!(b.render(), "a\nb\nc");
    }

    #[test]
    fn line_after_block_starts_on_a_fresh_line() {
        let mut b = Build::new();
        let block = b.boxed(b.root, BoxType::Block);
        b.text(block, "head");
        let line = b.boxed(b.root, BoxType::Line);
        b.text(line, "tail");
        assert_eq!(b.render(), "head\n\ntail");
    }

    #[test]
    fn inline_block_keeps_its_column() {
        let mut b = Build::new();
        let line = b.boxed(b.root, BoxType::Line);
        b.text(line, "key: ");
        let rect = b.boxed(line, BoxType::InlineBlock);
        b.text(rect, "first\nsecond");
        assert_eq!(b.render(), "key: first\n     second");
    }

    #[test]
    fn inline_text_continues_without_padding() {
        let mut b = Build::new();
        b.text(b.root, "key: ");
        let inline = b.boxed(b.root, BoxType::Inline);
        b.text(inline, "first\nsecond");
        b.text(inline, "!");
        assert_eq!(b.render(), "key: first\nsecond!");
    }

    #[test]
    fn empty_boxes_and_placeholders_vanish() {
        let mut b = Build::new();
        b.boxed(b.root, BoxType::Block);
        let placeholder = b.tree.create(TextItem::Placeholder { skipped: true });
        b.tree.append(b.root, placeholder);
        b.text(b.root, "");
        b.text(b.root, "only");
        assert_eq!(b.render(), "only");
    }

    #[test]
    fn bordered_block_is_framed() {
        let mut b = Build::new();
        let framed = b.bordered(b.root, BoxType::Block, Border::frame());
        b.text(framed, "hi");
        assert_eq!(b.render(), "+----+\n| hi |\n+----+");
    }

    #[test]
    fn bordered_inline_block_sits_after_text() {
        let mut b = Build::new();
        b.text(b.root, ">");
        let quoted = b.bordered(b.root, BoxType::InlineBlock, Border::default().left("| "));
        b.text(quoted, "a\nb");
        assert_eq!(b.render(), ">| a\n | b");
    }

    #[test]
    fn bordered_single_child_wrapper_is_kept() {
        let mut b = Build::new();
        let outer = b.bordered(b.root, BoxType::Line, Border::default().left("> "));
        let inner = b.boxed(outer, BoxType::Line);
        b.text(inner, "quoted");
        assert_eq!(b.render(), "> quoted");
    }

    #[test]
    fn bordered_and_plain_lines_break_alike() {
        let mut b = Build::new();
        b.text(b.root, "x");
        let line = b.boxed(b.root, BoxType::Line);
        b.text(line, "a");
        assert_eq!(b.render(), "xa");

        let mut b = Build::new();
        b.text(b.root, "x");
        let line = b.bordered(b.root, BoxType::Line, Border::default().left("> "));
        b.text(line, "a");
        b.text(b.root, "y");
        assert_eq!(b.render(), "x> a\ny");
    }

    #[test]
    fn framed_block_with_blank_content_renders_nothing() {
        let mut b = Build::new();
        let framed = b.bordered(b.root, BoxType::Block, Border::frame());
        b.text(framed, "\n");
        assert_eq!(b.render(), "");
    }

    #[test]
    fn nothing_renders_to_no_lines() {
        let b = Build::new();
        assert!(lines(&b.tree, b.root).is_empty());
    }
}
