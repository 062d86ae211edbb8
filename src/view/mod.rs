//! Views: named render implementations plus default options.
//!
//! A [`View`] is immutable once defined. Render implementations receive a
//! [`RenderCall`] holding the output node created for them, the computed props,
//! the resolved data and the context, plus a handle to the renderer so they
//! can render nested configs.
//!
//! # Example
//!
//! ```
//! use dashview::text::{TextBackend, TextRenderer};
//! use dashview::view::{RenderCall, RenderFn, ViewOptions};
//!
//! let renderer = TextRenderer::builder(TextBackend::new()).build();
//! renderer
//!     .define(
//!         "badge",
//!         RenderFn::sync(|call: RenderCall<TextBackend>| {
//!             call.node.append_text(&call.data.to_string());
//!             Ok(())
//!         }),
//!         ViewOptions::default(),
//!     )
//!     .unwrap();
//! assert!(renderer.registry().is_defined("badge"));
//! ```

mod registry;

pub use registry::{ViewDefinition, ViewRegistry};

use crate::domain::Result;
use crate::pipeline::{Backend, ListItem, Renderer};
use crate::props::Props;
use crate::query::Query;
use crate::text::{Border, BoxType};
use futures_util::future::{self, FutureExt, LocalBoxFuture};
use serde_json::Value;
use std::fmt;
use std::rc::Rc;

/// Deferred completion of a render implementation.
pub type RenderFuture = LocalBoxFuture<'static, Result<()>>;

/// Arguments of a render (or post-render) invocation.
pub struct RenderCall<B: Backend> {
    pub renderer: Renderer<B>,
    pub node: B::Node,
    pub props: Props<B>,
    pub data: Value,
    pub context: Value,
    /// Position in the list, when rendered through [`Renderer::render_list`].
    pub item: Option<ListItem>,
}

/// Render implementation: `(node, props, data, context)`.
pub struct RenderFn<B: Backend>(Rc<dyn Fn(RenderCall<B>) -> RenderFuture>);

impl<B: Backend> RenderFn<B> {
    /// Wraps an asynchronous render implementation.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(RenderCall<B>) -> Fut + 'static,
        Fut: std::future::Future<Output = Result<()>> + 'static,
    {
        Self(Rc::new(move |call| f(call).boxed_local()))
    }

    /// Wraps a synchronous render implementation.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(RenderCall<B>) -> Result<()> + 'static,
    {
        Self(Rc::new(move |call| future::ready(f(call)).boxed_local()))
    }

    pub fn call(&self, call: RenderCall<B>) -> RenderFuture {
        (self.0)(call)
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<B: Backend> Clone for RenderFn<B> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<B: Backend> fmt::Debug for RenderFn<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RenderFn(..)")
    }
}

/// Typed props reshaping: `(data, props, context) -> Option<props>`.
pub type PropsMapFn<B> = Rc<dyn Fn(&Value, Props<B>, &Value) -> Option<Props<B>>>;

/// A view's props transform.
#[derive(Clone)]
pub enum PropsTransform<B: Backend> {
    /// Query evaluated as `(data, {props, context})`.
    Query(Query),
    /// Function over typed props; keeps handlers and nested configs intact.
    Map(PropsMapFn<B>),
}

impl<B: Backend> PropsTransform<B> {
    pub fn map<F>(f: F) -> Self
    where
        F: Fn(&Value, Props<B>, &Value) -> Option<Props<B>> + 'static,
    {
        Self::Map(Rc::new(f))
    }
}

impl<B: Backend> fmt::Debug for PropsTransform<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query(query) => f.debug_tuple("Query").field(query).finish(),
            Self::Map(_) => f.write_str("Map(..)"),
        }
    }
}

/// Element produced for a view by the DOM backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    Element(String),
    /// Detached fragment whose children are spliced in directly.
    Fragment,
}

impl Default for Tag {
    fn default() -> Self {
        Self::Element("div".to_string())
    }
}

/// Default options declared with a view.
#[derive(Clone, Debug)]
pub struct ViewOptions<B: Backend> {
    /// Element tag for the DOM backend.
    pub tag: Tag,
    /// Box type for the text backend.
    pub box_type: BoxType,
    /// Props transform applied after `=` queries are resolved.
    pub props: Option<PropsTransform<B>>,
    /// Border for the text backend.
    pub border: Option<Border>,
}

impl<B: Backend> Default for ViewOptions<B> {
    fn default() -> Self {
        Self {
            tag: Tag::default(),
            box_type: BoxType::Inline,
            props: None,
            border: None,
        }
    }
}

impl<B: Backend> ViewOptions<B> {
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Tag::Element(tag.into());
        self
    }

    #[must_use]
    pub fn fragment(mut self) -> Self {
        self.tag = Tag::Fragment;
        self
    }

    #[must_use]
    pub const fn box_type(mut self, box_type: BoxType) -> Self {
        self.box_type = box_type;
        self
    }

    #[must_use]
    pub fn props(mut self, transform: PropsTransform<B>) -> Self {
        self.props = Some(transform);
        self
    }

    #[must_use]
    pub fn border(mut self, border: Border) -> Self {
        self.border = Some(border);
        self
    }
}

/// A registered view. Immutable once created.
#[derive(Debug)]
pub struct View<B: Backend> {
    name: String,
    render: RenderFn<B>,
    options: ViewOptions<B>,
}

impl<B: Backend> View<B> {
    pub(crate) fn new(name: impl Into<String>, render: RenderFn<B>, options: ViewOptions<B>) -> Self {
        Self {
            name: name.into(),
            render,
            options,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn render_fn(&self) -> &RenderFn<B> {
        &self.render
    }

    #[must_use]
    pub const fn options(&self) -> &ViewOptions<B> {
        &self.options
    }
}
