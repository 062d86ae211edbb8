//! The render pipeline shared by both backends.
//!
//! Every normalized config goes through the same state machine:
//!
//! ```text
//! resolve view ─► reserve placeholder ─► when ─► data ─► whenData
//!      │                                   │               │
//!      ▼                                   ▼               ▼
//!   (ERROR)                            (SKIPPED)       (SKIPPED)
//!
//! ─► props ─► view render ─► postRender ─► splice (RENDERED)
//!                  │
//!                  ▼
//!           (RENDERED_ERROR)
//! ```
//!
//! Placeholders are reserved synchronously, before the first suspension point,
//! so the final position of a view is fixed by config order and never by
//! completion order. Siblings run concurrently; each splices into its own
//! placeholder as soon as it finishes. Errors are caught at the placeholder and
//! rendered in place, they never reach siblings or ancestors.
//!
//! Backends plug in through [`Backend`]: they decide what a placeholder is,
//! what node a view renders into, and how error nodes look.

mod list;
mod state;
mod supersede;

pub use list::{list_limit, ListContinuation, ListItem, ListOptions};
pub use state::{PlaceholderState, Provenance, RenderOutcome};
pub use supersede::{RequestTicket, RequestTracker};

use crate::config::{self, ConfigFailure, RawConfig, ViewConfig, ViewRef};
use crate::domain::{DashviewError, EntityLookup, Marker, NoLookup, Result};
use crate::infrastructure::arena::{NodeId, SideTable};
use crate::props::{self, Props};
use crate::query::{self, PathQuery, QueryEngine};
use crate::view::{RenderCall, RenderFn, View, ViewDefinition, ViewOptions, ViewRegistry};
use crate::Settings;
use futures_util::future::{join_all, FutureExt, LocalBoxFuture};
use serde_json::Value;
use state::PlaceholderInfo;
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::rc::{Rc, Weak};

/// Output tree operations the pipeline needs from a backend.
pub trait Backend: Clone + fmt::Debug + 'static {
    /// Handle to a node of the output tree.
    type Node: Clone + fmt::Debug + 'static;

    /// Stable id of `node`.
    fn node_id(node: &Self::Node) -> NodeId;

    /// Appends a placeholder to `parent` and returns it.
    fn reserve(&self, parent: &Self::Node) -> Self::Node;

    /// Leaves `placeholder` in the tree as an inert marker.
    fn mark_skipped(&self, placeholder: &Self::Node);

    /// Creates the detached node a view renders into.
    fn create(&self, options: &ViewOptions<Self>) -> Self::Node;

    /// Replaces `placeholder` by `output`, returning the ids now in its place.
    fn splice(&self, placeholder: &Self::Node, output: &Self::Node) -> Vec<NodeId>;

    /// Builds a detached error node.
    fn render_failure(&self, error: &DashviewError, offending: Option<&Value>) -> Self::Node;

    /// Applies view classes and other per-view decorations to `output`.
    fn decorate(&self, output: &Self::Node, decoration: &Decoration<'_, Self>);

    /// Removes `node` and its subtree, returning every removed id.
    fn remove(&self, node: &Self::Node) -> Vec<NodeId>;

    /// `node` followed by its ancestors.
    fn lineage(&self, node: &Self::Node) -> Vec<NodeId>;

    /// Renders "more items" affordances after a bounded list slice.
    ///
    /// `container` holds the items; `more.more_container`, when set, is where
    /// the affordances belong.
    fn render_more(renderer: &Renderer<Self>, container: &Self::Node, more: ListContinuation<Self>);

    /// Definition-time option problems, reported as warnings.
    fn check_options(_options: &ViewOptions<Self>) -> Vec<String> {
        Vec::new()
    }

    /// Views every renderer of this backend starts with.
    fn builtin_views() -> Vec<ViewDefinition<Self>> {
        Vec::new()
    }
}

/// What a backend gets to decorate a freshly rendered node with.
pub struct Decoration<'a, B: Backend> {
    pub settings: &'a Settings,
    pub view: Option<&'a str>,
    pub classes: &'a [String],
    pub props: &'a Props<B>,
    pub data: &'a Value,
    pub context: &'a Value,
}

enum Resolved<B: Backend> {
    View(Rc<View<B>>),
    Inline(RenderFn<B>),
    Failure(ConfigFailure),
}

struct Inner<B: Backend> {
    backend: B,
    registry: ViewRegistry<B>,
    engine: Rc<dyn QueryEngine>,
    lookup: Rc<dyn EntityLookup>,
    settings: Settings,
    placeholders: RefCell<SideTable<PlaceholderInfo>>,
    provenance: RefCell<SideTable<Provenance<B>>>,
}

/// Renders configs into a backend's output tree.
///
/// Cheap to clone; clones share the registry, backend and side tables.
pub struct Renderer<B: Backend> {
    inner: Rc<Inner<B>>,
}

impl<B: Backend> Clone for Renderer<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<B: Backend> fmt::Debug for Renderer<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("backend", &self.inner.backend)
            .field("views", &self.inner.registry.names())
            .finish_non_exhaustive()
    }
}

/// Non-owning handle to a [`Renderer`], for callbacks stored in its own output.
pub struct WeakRenderer<B: Backend> {
    inner: Weak<Inner<B>>,
}

impl<B: Backend> Clone for WeakRenderer<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<B: Backend> WeakRenderer<B> {
    #[must_use]
    pub fn upgrade(&self) -> Option<Renderer<B>> {
        self.inner.upgrade().map(|inner| Renderer { inner })
    }
}

/// Builder for [`Renderer`].
pub struct RendererBuilder<B: Backend> {
    backend: B,
    engine: Rc<dyn QueryEngine>,
    lookup: Rc<dyn EntityLookup>,
    settings: Settings,
    builtins: bool,
}

impl<B: Backend> RendererBuilder<B> {
    /// Query engine used for every query; defaults to [`PathQuery`].
    #[must_use]
    pub fn query_engine(mut self, engine: impl QueryEngine + 'static) -> Self {
        self.engine = Rc::new(engine);
        self
    }

    /// Entity lookup used for value annotation; defaults to none.
    #[must_use]
    pub fn lookup(mut self, lookup: impl EntityLookup + 'static) -> Self {
        self.lookup = Rc::new(lookup);
        self
    }

    #[must_use]
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Skips the backend's built-in views.
    #[must_use]
    pub const fn without_builtins(mut self) -> Self {
        self.builtins = false;
        self
    }

    #[must_use]
    pub fn build(self) -> Renderer<B> {
        let renderer = Renderer {
            inner: Rc::new(Inner {
                backend: self.backend,
                registry: ViewRegistry::new(),
                engine: self.engine,
                lookup: self.lookup,
                settings: self.settings,
                placeholders: RefCell::new(SideTable::default()),
                provenance: RefCell::new(SideTable::default()),
            }),
        };
        if self.builtins {
            renderer.inner.registry.define_all(B::builtin_views());
        }
        renderer
    }
}

impl<B: Backend> Renderer<B> {
    #[must_use]
    pub fn builder(backend: B) -> RendererBuilder<B> {
        RendererBuilder {
            backend,
            engine: Rc::new(PathQuery),
            lookup: Rc::new(NoLookup),
            settings: Settings::default(),
            builtins: true,
        }
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakRenderer<B> {
        WeakRenderer {
            inner: Rc::downgrade(&self.inner),
        }
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    #[must_use]
    pub fn registry(&self) -> &ViewRegistry<B> {
        &self.inner.registry
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    #[must_use]
    pub fn engine(&self) -> Rc<dyn QueryEngine> {
        Rc::clone(&self.inner.engine)
    }

    /// Marker for `value` from the injected entity lookup.
    #[must_use]
    pub fn annotate(&self, value: &Value) -> Option<Marker> {
        self.inner.lookup.lookup(value)
    }

    /// Defines a view on this renderer's registry.
    ///
    /// # Errors
    ///
    /// Fails when the name is empty or already defined.
    pub fn define(&self, name: &str, render: RenderFn<B>, options: ViewOptions<B>) -> Result<Rc<View<B>>> {
        self.inner.registry.define(name, render, options)
    }

    /// Normalizes a raw config with this renderer's query engine.
    #[must_use]
    pub fn normalize_config(&self, raw: impl Into<RawConfig<B>>) -> Vec<ViewConfig<B>> {
        config::normalize_config(self.inner.engine.as_ref(), raw.into())
    }

    /// Shallow-merges `extension` into `base`; extension wins.
    #[must_use]
    pub fn compose_config(&self, base: impl Into<RawConfig<B>>, extension: &ViewConfig<B>) -> RawConfig<B> {
        config::compose_config(self.inner.engine.as_ref(), base.into(), extension)
    }

    /// Computes the props `config` would receive, including the view's transform.
    ///
    /// # Errors
    ///
    /// Fails when a query fails.
    pub async fn props_from_config(&self, config: &ViewConfig<B>, data: &Value, context: &Value) -> Result<Props<B>> {
        let view = match &config.view {
            Some(ViewRef::Named(name)) => self.inner.registry.get(name),
            _ => None,
        };
        let transform = view.as_ref().and_then(|view| view.options().props.as_ref());
        props::props_from_config(self.engine(), config, transform, data, context).await
    }

    /// Renders `config` at the end of `container`.
    ///
    /// Resolves with `container` once every view of the config has settled.
    /// Never fails: problems are rendered in place.
    pub fn render(
        &self,
        container: &B::Node,
        config: impl Into<RawConfig<B>>,
        data: Value,
        context: Value,
    ) -> LocalBoxFuture<'static, B::Node> {
        self.render_item(container, config, data, context, None)
    }

    /// Like [`Renderer::render`], handing `item` to every view of the config.
    ///
    /// List item views pass their own [`ListItem`] through here so nested
    /// content still sees its position in the list.
    pub fn render_item(
        &self,
        container: &B::Node,
        config: impl Into<RawConfig<B>>,
        data: Value,
        context: Value,
        item: Option<ListItem>,
    ) -> LocalBoxFuture<'static, B::Node> {
        let outcomes = self.render_all_in(container, config.into(), data, context, item);
        let container = container.clone();
        outcomes.map(move |_| container).boxed_local()
    }

    /// Like [`Renderer::render`], resolving with each config's outcome in order.
    pub fn render_all(
        &self,
        container: &B::Node,
        config: impl Into<RawConfig<B>>,
        data: Value,
        context: Value,
    ) -> LocalBoxFuture<'static, Vec<RenderOutcome>> {
        self.render_all_in(container, config.into(), data, context, None)
    }

    fn render_all_in(
        &self,
        container: &B::Node,
        config: RawConfig<B>,
        data: Value,
        context: Value,
        item: Option<ListItem>,
    ) -> LocalBoxFuture<'static, Vec<RenderOutcome>> {
        let tasks: Vec<_> = self
            .normalize_config(config)
            .into_iter()
            .map(|config| self.render_config_in(container, config, data.clone(), context.clone(), item.clone()))
            .collect();
        join_all(tasks).boxed_local()
    }

    /// Runs the pipeline for one normalized config.
    ///
    /// The placeholder is reserved before this returns.
    pub fn render_config(
        &self,
        container: &B::Node,
        config: ViewConfig<B>,
        data: Value,
        context: Value,
    ) -> LocalBoxFuture<'static, RenderOutcome> {
        self.render_config_in(container, config, data, context, None)
    }

    fn render_config_in(
        &self,
        container: &B::Node,
        config: ViewConfig<B>,
        data: Value,
        context: Value,
        item: Option<ListItem>,
    ) -> LocalBoxFuture<'static, RenderOutcome> {
        let config = Rc::new(config::ensure_valid_config(config));
        let resolved = self.resolve(&config);
        let placeholder = self.inner.backend.reserve(container);
        self.inner.placeholders.borrow_mut().insert(
            B::node_id(&placeholder),
            PlaceholderInfo {
                view: config.view_name().map(String::from),
                state: PlaceholderState::Pending,
            },
        );

        let renderer = self.clone();
        async move { renderer.run(placeholder, config, resolved, data, context, item).await }.boxed_local()
    }

    /// State of a placeholder still in the tree.
    #[must_use]
    pub fn placeholder_state(&self, placeholder: &B::Node) -> Option<PlaceholderState> {
        self.inner
            .placeholders
            .borrow()
            .get(B::node_id(placeholder))
            .map(|info| info.state)
    }

    /// Number of placeholders that have not resolved yet.
    #[must_use]
    pub fn pending_placeholders(&self) -> usize {
        self.inner
            .placeholders
            .borrow()
            .values()
            .filter(|info| info.state == PlaceholderState::Pending)
            .count()
    }

    /// Provenance of `node` or of its nearest attributed ancestor.
    #[must_use]
    pub fn provenance_of(&self, node: &B::Node) -> Option<Provenance<B>> {
        let table = self.inner.provenance.borrow();
        self.inner
            .backend
            .lineage(node)
            .into_iter()
            .find_map(|id| table.get(id).cloned())
    }

    /// Removes `node`'s subtree and every side-table entry attached to it.
    pub fn discard(&self, node: &B::Node) {
        let removed = self.inner.backend.remove(node);
        self.forget(&removed);
    }

    fn forget(&self, ids: &[NodeId]) {
        let mut placeholders = self.inner.placeholders.borrow_mut();
        for id in ids {
            if let Some(info) = placeholders.get(*id).filter(|info| info.state == PlaceholderState::Pending) {
                tracing::debug!(view = ?info.view, "pending placeholder discarded");
            }
        }
        placeholders.forget(ids);
        drop(placeholders);
        self.inner.provenance.borrow_mut().forget(ids);
    }

    fn resolve(&self, config: &ViewConfig<B>) -> Resolved<B> {
        match &config.view {
            Some(ViewRef::Named(name)) => match self.inner.registry.get(name) {
                Some(view) => Resolved::View(view),
                None => Resolved::Failure(ConfigFailure {
                    error: DashviewError::Lookup(name.clone()),
                    offending: config.to_json(),
                }),
            },
            Some(ViewRef::Inline(render)) => Resolved::Inline(render.clone()),
            Some(ViewRef::Failure(failure)) => Resolved::Failure(failure.clone()),
            None => Resolved::Failure(ConfigFailure {
                error: DashviewError::Config("config is missing a `view`".to_string()),
                offending: config.to_json(),
            }),
        }
    }

    async fn run(
        self,
        placeholder: B::Node,
        config: Rc<ViewConfig<B>>,
        resolved: Resolved<B>,
        data: Value,
        context: Value,
        item: Option<ListItem>,
    ) -> RenderOutcome {
        let view = match resolved {
            Resolved::Failure(failure) => {
                tracing::warn!(error = %failure.error, "unusable view config");
                self.fill_with_error(&placeholder, &failure.error, Some(&failure.offending));
                return RenderOutcome::Error;
            }
            other => other,
        };

        match self.produce(&config, &view, data, context, item).await {
            Ok(Some((output, props))) => {
                let placed = self.inner.backend.splice(&placeholder, &output);
                self.inner.placeholders.borrow_mut().remove(B::node_id(&placeholder));
                let provenance = Provenance {
                    view: config.view_name().map(String::from),
                    config: Rc::clone(&config),
                    props,
                };
                let mut table = self.inner.provenance.borrow_mut();
                for id in placed {
                    table.insert(id, provenance.clone());
                }
                RenderOutcome::Rendered
            }
            Ok(None) => {
                self.inner.backend.mark_skipped(&placeholder);
                if let Some(info) = self
                    .inner
                    .placeholders
                    .borrow_mut()
                    .get_mut(B::node_id(&placeholder))
                {
                    info.state = PlaceholderState::Skipped;
                }
                tracing::debug!(view = ?config.view_name(), "view skipped");
                RenderOutcome::Skipped
            }
            Err(error) => {
                tracing::error!(view = ?config.view_name(), error = %error, "view render failed");
                self.fill_with_error(&placeholder, &error, None);
                RenderOutcome::RenderedError
            }
        }
    }

    /// Conditions, data, props, render and post-render; `None` means skipped.
    async fn produce(
        &self,
        config: &ViewConfig<B>,
        view: &Resolved<B>,
        data: Value,
        context: Value,
        item: Option<ListItem>,
    ) -> Result<Option<(B::Node, Props<B>)>> {
        let engine = self.engine();

        if let Some(when) = &config.when {
            if !query::run_bool(&engine, when, &data, &context).await? {
                return Ok(None);
            }
        }

        let data = match &config.data {
            Some(query) => query::run(&engine, query, &data, &context).await?,
            None => data,
        };

        if let Some(when_data) = &config.when_data {
            if !query::run_bool(&engine, when_data, &data, &context).await? {
                return Ok(None);
            }
        }

        let default_options = ViewOptions::default();
        let (render, options, name) = match view {
            Resolved::View(view) => (view.render_fn().clone(), view.options(), Some(view.name())),
            Resolved::Inline(render) => (render.clone(), &default_options, None),
            Resolved::Failure(failure) => return Err(failure.error.clone()),
        };

        let props = props::props_from_config(Rc::clone(&engine), config, options.props.as_ref(), &data, &context).await?;
        let classes = props::class_names(engine, config.class_name.as_deref(), &data, &context).await?;

        let output = self.inner.backend.create(options);
        let call = RenderCall {
            renderer: self.clone(),
            node: output.clone(),
            props: props.clone(),
            data: data.clone(),
            context: context.clone(),
            item: item.clone(),
        };
        if let Err(error) = guarded(&render, call).await {
            self.discard(&output);
            return Err(error);
        }

        if let Some(post_render) = &config.post_render {
            let call = RenderCall {
                renderer: self.clone(),
                node: output.clone(),
                props: props.clone(),
                data: data.clone(),
                context: context.clone(),
                item,
            };
            if let Err(error) = guarded(post_render, call).await {
                self.discard(&output);
                return Err(error);
            }
        }

        let decoration = Decoration {
            settings: &self.inner.settings,
            view: name,
            classes: &classes,
            props: &props,
            data: &data,
            context: &context,
        };
        self.inner.backend.decorate(&output, &decoration);
        Ok(Some((output, props)))
    }

    fn fill_with_error(&self, placeholder: &B::Node, error: &DashviewError, offending: Option<&Value>) {
        let output = self.inner.backend.render_failure(error, offending);
        self.inner.backend.splice(placeholder, &output);
        self.inner.placeholders.borrow_mut().remove(B::node_id(placeholder));
    }
}

/// Calls a render implementation, turning panics into render errors.
async fn guarded<B: Backend>(render: &RenderFn<B>, call: RenderCall<B>) -> Result<()> {
    let future = match std::panic::catch_unwind(AssertUnwindSafe(|| render.call(call))) {
        Ok(future) => future,
        Err(payload) => return Err(DashviewError::Render(panic_message(payload.as_ref()))),
    };
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(DashviewError::Render(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "view panicked".to_string())
}
