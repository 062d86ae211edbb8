//! Box borders for the text backend.
//!
//! Left and right sides are either a literal string or a per-line function of
//! `(index, total)`, which is how numbered gutters and list bullets are drawn.
//! Top and bottom edges are either a fill pattern or a function of
//! `(content_width, left_width, right_width)`.

use std::fmt;
use std::rc::Rc;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Per-line side decoration.
#[derive(Clone)]
pub enum SideBorder {
    Text(String),
    PerLine(Rc<dyn Fn(usize, usize) -> String>),
}

impl SideBorder {
    fn render(&self, index: usize, total: usize) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::PerLine(f) => f(index, total),
        }
    }
}

impl fmt::Debug for SideBorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::PerLine(_) => f.write_str("PerLine(..)"),
        }
    }
}

/// Top or bottom edge.
#[derive(Clone)]
pub enum EdgeBorder {
    /// Pattern repeated over the full bordered width.
    Fill(String),
    Fn(Rc<dyn Fn(usize, usize, usize) -> String>),
}

impl EdgeBorder {
    fn render(&self, content_width: usize, left_width: usize, right_width: usize) -> String {
        match self {
            Self::Fill(pattern) => fill(pattern, content_width + left_width + right_width),
            Self::Fn(f) => f(content_width, left_width, right_width),
        }
    }
}

impl fmt::Debug for EdgeBorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fill(pattern) => f.debug_tuple("Fill").field(pattern).finish(),
            Self::Fn(_) => f.write_str("Fn(..)"),
        }
    }
}

/// Border around a box.
///
/// # Examples
///
/// ```
/// use dashview::text::Border;
///
/// let border = Border::default()
///     .left_fn(|index, _total| if index == 0 { "* ".into() } else { "  ".into() });
/// let lines = border.apply(&["one".to_string(), "two".to_string()]);
/// assert_eq!(lines, ["* one", "  two"]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Border {
    pub left: Option<SideBorder>,
    pub right: Option<SideBorder>,
    pub top: Option<EdgeBorder>,
    pub bottom: Option<EdgeBorder>,
}

impl Border {
    /// Single-line frame drawn with `|` and `-`.
    #[must_use]
    pub fn frame() -> Self {
        Self::default()
            .left("| ")
            .right(" |")
            .top_fn(frame_edge)
            .bottom_fn(frame_edge)
    }

    #[must_use]
    pub fn left(mut self, text: impl Into<String>) -> Self {
        self.left = Some(SideBorder::Text(text.into()));
        self
    }

    #[must_use]
    pub fn left_fn(mut self, f: impl Fn(usize, usize) -> String + 'static) -> Self {
        self.left = Some(SideBorder::PerLine(Rc::new(f)));
        self
    }

    #[must_use]
    pub fn right(mut self, text: impl Into<String>) -> Self {
        self.right = Some(SideBorder::Text(text.into()));
        self
    }

    #[must_use]
    pub fn right_fn(mut self, f: impl Fn(usize, usize) -> String + 'static) -> Self {
        self.right = Some(SideBorder::PerLine(Rc::new(f)));
        self
    }

    #[must_use]
    pub fn top(mut self, pattern: impl Into<String>) -> Self {
        self.top = Some(EdgeBorder::Fill(pattern.into()));
        self
    }

    #[must_use]
    pub fn top_fn(mut self, f: impl Fn(usize, usize, usize) -> String + 'static) -> Self {
        self.top = Some(EdgeBorder::Fn(Rc::new(f)));
        self
    }

    #[must_use]
    pub fn bottom(mut self, pattern: impl Into<String>) -> Self {
        self.bottom = Some(EdgeBorder::Fill(pattern.into()));
        self
    }

    #[must_use]
    pub fn bottom_fn(mut self, f: impl Fn(usize, usize, usize) -> String + 'static) -> Self {
        self.bottom = Some(EdgeBorder::Fn(Rc::new(f)));
        self
    }

    /// Decorates `content` lines.
    ///
    /// Content is padded to its widest line and left/right decorations to
    /// their widest variant, so every side-bordered line has the same width.
    /// Empty content gets no decoration at all, edges included.
    #[must_use]
    pub fn apply(&self, content: &[String]) -> Vec<String> {
        if content.is_empty() {
            return Vec::new();
        }
        let total = content.len();
        let content_width = content.iter().map(|line| width(line)).max().unwrap_or(0);
        let lefts = side(self.left.as_ref(), total);
        let rights = side(self.right.as_ref(), total);
        let left_width = lefts.iter().map(|s| width(s)).max().unwrap_or(0);
        let right_width = rights.iter().map(|s| width(s)).max().unwrap_or(0);

        let mut lines = Vec::with_capacity(total + 2);
        if let Some(top) = &self.top {
            lines.push(top.render(content_width, left_width, right_width));
        }
        for (index, line) in content.iter().enumerate() {
            let mut out = pad(&lefts[index], left_width);
            out.push_str(&pad(line, content_width));
            out.push_str(&pad(&rights[index], right_width));
            lines.push(out);
        }
        if let Some(bottom) = &self.bottom {
            lines.push(bottom.render(content_width, left_width, right_width));
        }
        lines
    }
}

fn side(border: Option<&SideBorder>, total: usize) -> Vec<String> {
    (0..total)
        .map(|index| border.map(|b| b.render(index, total)).unwrap_or_default())
        .collect()
}

fn frame_edge(content_width: usize, left_width: usize, right_width: usize) -> String {
    let inner = (content_width + left_width + right_width).saturating_sub(2);
    format!("+{}+", "-".repeat(inner))
}

/// Repeats `pattern` up to `total` columns; a wide char that would overflow
/// is replaced by spaces.
fn fill(pattern: &str, total: usize) -> String {
    let mut out = String::new();
    if width(pattern) == 0 {
        return out;
    }
    let mut filled = 0;
    for c in pattern.chars().cycle() {
        let cells = c.width().unwrap_or(0);
        if filled + cells > total {
            break;
        }
        out.push(c);
        filled += cells;
        if filled == total {
            break;
        }
    }
    out.extend(std::iter::repeat(' ').take(total - filled));
    out
}

/// Display width in terminal cells.
pub(crate) fn width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

fn pad(text: &str, to: usize) -> String {
    let mut out = text.to_string();
    out.extend(std::iter::repeat(' ').take(to.saturating_sub(width(text))));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn bullet_gutter_marks_first_line_only() {
        let border = Border::default().left_fn(|index, _| if index == 0 { "* ".into() } else { "  ".into() });
        let out = border.apply(&lines(&["a", "bbb", "cc"]));
        assert!(out[0].starts_with("* "));
        assert!(out[1].starts_with("  "));
        assert!(out[2].starts_with("  "));
        assert!(out.iter().all(|line| width(line) == width(&out[0])));
    }

    #[test]
    fn uneven_side_borders_still_align() {
        let border = Border::default().left_fn(|index, total| format!("{}/{total} ", index + 1).repeat(index + 1));
        let out = border.apply(&lines(&["x", "y"]));
        assert_eq!(width(&out[0]), width(&out[1]));
    }

    #[test]
    fn frame_wraps_content() {
        let out = Border::frame().apply(&lines(&["ab", "c"]));
        assert_eq!(out, ["+----+", "| ab |", "| c  |", "+----+"]);
    }

    #[test]
    fn empty_content_draws_no_frame() {
        assert!(Border::frame().apply(&[]).is_empty());
        assert_eq!(frame_edge(0, 0, 0), "++");
    }

    #[test]
    fn wide_characters_keep_the_frame_aligned() {
        let out = Border::frame().apply(&lines(&["漢字", "ab"]));
        assert_eq!(out, ["+------+", "| 漢字 |", "| ab   |", "+------+"]);
    }

    #[test]
    fn wide_fill_patterns_never_overflow() {
        assert_eq!(fill("═", 3), "═══");
        assert_eq!(fill("漢", 3), "漢 ");
        assert_eq!(fill("", 3), "");
    }

    #[test]
    fn fill_edges_span_the_full_width() {
        let out = Border::default().left("[").right("]").top("=-").apply(&lines(&["abc"]));
        assert_eq!(out, ["=-=-=", "[abc]"]);
    }
}
