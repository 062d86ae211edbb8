//! Per-node render bookkeeping: outcomes, placeholder states and provenance.

use crate::config::ViewConfig;
use crate::pipeline::Backend;
use crate::props::Props;
use std::rc::Rc;

/// Terminal state of one config's pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// `when` or `whenData` was false; the placeholder stays as a marker.
    Skipped,
    /// The view rendered and was spliced in.
    Rendered,
    /// Something failed while resolving or rendering; an error node took the spot.
    RenderedError,
    /// The config itself was unusable (malformed, unknown view).
    Error,
}

/// State of a placeholder that is still in the tree.
///
/// Spliced placeholders leave the tree and their entry is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderState {
    Pending,
    Skipped,
}

#[derive(Debug, Clone)]
pub(crate) struct PlaceholderInfo {
    pub view: Option<String>,
    pub state: PlaceholderState,
}

/// Which config produced a node.
#[derive(Debug, Clone)]
pub struct Provenance<B: Backend> {
    /// Registered view name; `None` for inline and error views.
    pub view: Option<String>,
    pub config: Rc<ViewConfig<B>>,
    pub props: Props<B>,
}
