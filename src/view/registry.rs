//! Append-only view registry.
//!
//! Each renderer owns one registry. Views are written through [`ViewRegistry::define`]
//! only; a name can be defined once and the stored [`View`] is never mutated.

use super::{RenderFn, View, ViewOptions};
use crate::domain::{DashviewError, Result};
use crate::pipeline::Backend;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One entry of a view catalog.
#[derive(Debug, Clone)]
pub struct ViewDefinition<B: Backend> {
    pub name: String,
    pub render: RenderFn<B>,
    pub options: ViewOptions<B>,
}

impl<B: Backend> ViewDefinition<B> {
    pub fn new(name: impl Into<String>, render: RenderFn<B>, options: ViewOptions<B>) -> Self {
        Self {
            name: name.into(),
            render,
            options,
        }
    }
}

/// Name → view dictionary.
#[derive(Debug)]
pub struct ViewRegistry<B: Backend> {
    views: RefCell<HashMap<String, Rc<View<B>>>>,
    order: RefCell<Vec<String>>,
}

impl<B: Backend> Default for ViewRegistry<B> {
    fn default() -> Self {
        Self {
            views: RefCell::new(HashMap::new()),
            order: RefCell::new(Vec::new()),
        }
    }
}

impl<B: Backend> ViewRegistry<B> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines a view.
    ///
    /// Option problems the backend can detect up front (see
    /// [`Backend::check_options`]) are logged as warnings here, not at render
    /// time.
    ///
    /// # Errors
    ///
    /// Returns [`DashviewError::Definition`] when the name is empty or taken.
    pub fn define(&self, name: &str, render: RenderFn<B>, options: ViewOptions<B>) -> Result<Rc<View<B>>> {
        if name.trim().is_empty() {
            return Err(DashviewError::Definition("view name must not be empty".to_string()));
        }
        if self.views.borrow().contains_key(name) {
            return Err(DashviewError::Definition(format!("view `{name}` is already defined")));
        }

        for problem in B::check_options(&options) {
            tracing::warn!(view = %name, problem = %problem, "view misconfigured");
        }

        let view = Rc::new(View::new(name, render, options));
        self.views.borrow_mut().insert(name.to_string(), Rc::clone(&view));
        self.order.borrow_mut().push(name.to_string());
        tracing::debug!(view = %name, "view defined");
        Ok(view)
    }

    /// Defines every entry of `catalog` in order.
    ///
    /// A failing entry does not stop the rest; failures are logged and returned.
    pub fn define_all(&self, catalog: impl IntoIterator<Item = ViewDefinition<B>>) -> Vec<DashviewError> {
        let mut failures = Vec::new();
        for entry in catalog {
            if let Err(error) = self.define(&entry.name, entry.render, entry.options) {
                tracing::warn!(view = %entry.name, error = %error, "view definition skipped");
                failures.push(error);
            }
        }
        failures
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Rc<View<B>>> {
        self.views.borrow().get(name).cloned()
    }

    #[must_use]
    pub fn is_defined(&self, name: &str) -> bool {
        self.views.borrow().contains_key(name)
    }

    /// Names in definition order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.order.borrow().clone()
    }
}
