//! View configs: raw shorthand forms and the typed normalized form.
//!
//! A config describes one or more views to render against some data. Callers
//! write configs in several shapes ([`RawConfig`]): a string shorthand, an
//! inline render function, an object, or a list. [`normalize_config`] turns
//! every shape into a flat list of [`ViewConfig`] values whose `view` has been
//! resolved into a tagged [`ViewRef`], so the render pipeline never re-inspects
//! config shapes.
//!
//! # Shorthand strings
//!
//! ```text
//! "badge"              → {view: "badge"}
//! "badge:count"        → {view: "badge", data: "count"}
//! "badge{text: 'hi'}"  → {view: "badge", text: "hi"}
//! ```

mod normalize;

pub use normalize::{compose_config, ensure_valid_config, normalize_config};

use crate::domain::DashviewError;
use crate::pipeline::Backend;
use crate::props::Props;
use crate::query::Query;
use crate::view::RenderFn;
use serde_json::{Map, Value};
use std::fmt;
use std::rc::Rc;

/// Keys that configure the pipeline and never become props.
pub const CONFIG_ONLY_KEYS: [&str; 6] = ["view", "when", "data", "whenData", "postRender", "className"];

/// Callback carried in props, called with `(value, context)`.
#[derive(Clone)]
pub struct Handler(pub Rc<dyn Fn(&Value, &Value)>);

impl Handler {
    pub fn new(f: impl Fn(&Value, &Value) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, value: &Value, context: &Value) {
        (self.0)(value, context);
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler(..)")
    }
}

/// A single prop value.
#[derive(Clone, Debug)]
pub enum PropValue<B: Backend> {
    /// Plain JSON. Strings starting with `=` are queries.
    Json(Value),
    /// Nested config, e.g. an item or content config.
    Config(RawConfig<B>),
    /// Event callback.
    Handler(Handler),
}

impl<B: Backend> PropValue<B> {
    #[must_use]
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// JSON form; nested configs are converted best-effort.
    #[must_use]
    pub fn to_json(&self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value.clone()),
            Self::Config(config) => Some(config.to_json()),
            Self::Handler(_) => None,
        }
    }
}

impl<B: Backend> From<Value> for PropValue<B> {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl<B: Backend> From<&str> for PropValue<B> {
    fn from(text: &str) -> Self {
        Self::Json(Value::String(text.to_string()))
    }
}

/// How a config names its view.
#[derive(Clone, Debug)]
pub enum ViewRef<B: Backend> {
    /// Registered view, looked up by name.
    Named(String),
    /// Render function supplied in place.
    Inline(RenderFn<B>),
    /// Malformed config, rendered by the backend's error renderer.
    Failure(ConfigFailure),
}

/// Error config payload: the reason plus the offending input.
#[derive(Clone, Debug)]
pub struct ConfigFailure {
    pub error: DashviewError,
    pub offending: Value,
}

/// Normalized config.
///
/// `view` is `None` only for configs that have not been through
/// [`ensure_valid_config`] yet; the pipeline never renders such a config.
#[derive(Clone, Debug)]
pub struct ViewConfig<B: Backend> {
    pub view: Option<ViewRef<B>>,
    pub when: Option<Query>,
    pub data: Option<Query>,
    pub when_data: Option<Query>,
    pub post_render: Option<RenderFn<B>>,
    pub class_name: Option<Box<PropValue<B>>>,
    pub props: Props<B>,
}

impl<B: Backend> Default for ViewConfig<B> {
    fn default() -> Self {
        Self {
            view: None,
            when: None,
            data: None,
            when_data: None,
            post_render: None,
            class_name: None,
            props: Props::default(),
        }
    }
}

impl<B: Backend> ViewConfig<B> {
    /// Config for a registered view.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            view: Some(ViewRef::Named(name.into())),
            ..Self::default()
        }
    }

    /// Config for an inline render function.
    #[must_use]
    pub fn inline(render: RenderFn<B>) -> Self {
        Self {
            view: Some(ViewRef::Inline(render)),
            ..Self::default()
        }
    }

    /// Error config carrying the offending input.
    #[must_use]
    pub fn failure(error: DashviewError, offending: Value) -> Self {
        Self {
            view: Some(ViewRef::Failure(ConfigFailure { error, offending })),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_data(mut self, query: impl Into<Query>) -> Self {
        self.data = Some(query.into());
        self
    }

    #[must_use]
    pub fn with_when(mut self, query: impl Into<Query>) -> Self {
        self.when = Some(query.into());
        self
    }

    #[must_use]
    pub fn with_when_data(mut self, query: impl Into<Query>) -> Self {
        self.when_data = Some(query.into());
        self
    }

    #[must_use]
    pub fn with_post_render(mut self, post_render: RenderFn<B>) -> Self {
        self.post_render = Some(post_render);
        self
    }

    #[must_use]
    pub fn with_class(mut self, class_name: impl Into<PropValue<B>>) -> Self {
        self.class_name = Some(Box::new(class_name.into()));
        self
    }

    #[must_use]
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<PropValue<B>>) -> Self {
        self.props.insert(key, value);
        self
    }

    /// Builds a config from a JSON object.
    ///
    /// `when`, `data` and `whenData` strings become query text, other values
    /// stay literals. `postRender` cannot be expressed in JSON and makes the
    /// whole object an error config.
    #[must_use]
    pub fn from_json(fields: Map<String, Value>) -> Self {
        let offending = Value::Object(fields.clone());
        let mut config = Self::default();
        for (key, value) in fields {
            match key.as_str() {
                "view" => match value {
                    Value::String(name) => config.view = Some(ViewRef::Named(name)),
                    Value::Null => {}
                    other => {
                        return Self::failure(
                            DashviewError::Config(format!("`view` must be a string, got {other}")),
                            offending,
                        );
                    }
                },
                "when" => config.when = Some(Query::from_json(value)),
                "data" => config.data = Some(Query::from_json(value)),
                "whenData" => config.when_data = Some(Query::from_json(value)),
                "className" => config.class_name = Some(Box::new(PropValue::Json(value))),
                "postRender" => {
                    return Self::failure(
                        DashviewError::Config("`postRender` must be a function".to_string()),
                        offending,
                    );
                }
                _ => {
                    config.props.insert(key, PropValue::Json(value));
                }
            }
        }
        config
    }

    /// Best-effort JSON description, used for error reporting.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        match &self.view {
            Some(ViewRef::Named(name)) => {
                out.insert("view".into(), Value::String(name.clone()));
            }
            Some(ViewRef::Inline(_)) => {
                out.insert("view".into(), Value::String("<fn>".into()));
            }
            Some(ViewRef::Failure(failure)) => return failure.offending.clone(),
            None => {}
        }
        let queries = [("when", &self.when), ("data", &self.data), ("whenData", &self.when_data)];
        for (key, query) in queries {
            if let Some(query) = query {
                out.insert(
                    key.into(),
                    query.to_json().unwrap_or_else(|| Value::String("<fn>".into())),
                );
            }
        }
        if self.post_render.is_some() {
            out.insert("postRender".into(), Value::String("<fn>".into()));
        }
        if let Some(class_name) = self.class_name.as_deref().and_then(PropValue::to_json) {
            out.insert("className".into(), class_name);
        }
        for (key, value) in self.props.iter() {
            if let Some(json) = value.to_json() {
                out.insert(key.clone(), json);
            }
        }
        Value::Object(out)
    }

    /// Name used for CSS classes and diagnostics.
    #[must_use]
    pub fn view_name(&self) -> Option<&str> {
        match &self.view {
            Some(ViewRef::Named(name)) => Some(name),
            _ => None,
        }
    }
}

/// Any accepted config shape.
#[derive(Clone, Debug)]
pub enum RawConfig<B: Backend> {
    /// Renders nothing.
    Null,
    /// String shorthand.
    Text(String),
    /// Inline render function.
    Inline(RenderFn<B>),
    /// Object form, possibly still missing `view`.
    Object(ViewConfig<B>),
    /// Sequence of configs rendered concurrently, in order.
    List(Vec<RawConfig<B>>),
    /// JSON that is neither null, string, object nor array.
    Invalid(Value),
}

impl<B: Backend> RawConfig<B> {
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Text(text) => Value::String(text.clone()),
            Self::Inline(_) => Value::String("<fn>".into()),
            Self::Object(config) => config.to_json(),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Invalid(value) => value.clone(),
        }
    }
}

impl<B: Backend> From<Value> for RawConfig<B> {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::String(text) => Self::Text(text),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(fields) => Self::Object(ViewConfig::from_json(fields)),
            other => Self::Invalid(other),
        }
    }
}

impl<B: Backend> From<&str> for RawConfig<B> {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl<B: Backend> From<String> for RawConfig<B> {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl<B: Backend> From<ViewConfig<B>> for RawConfig<B> {
    fn from(config: ViewConfig<B>) -> Self {
        Self::Object(config)
    }
}

impl<B: Backend> From<RenderFn<B>> for RawConfig<B> {
    fn from(render: RenderFn<B>) -> Self {
        Self::Inline(render)
    }
}

impl<B: Backend> From<Vec<ViewConfig<B>>> for RawConfig<B> {
    fn from(configs: Vec<ViewConfig<B>>) -> Self {
        Self::List(configs.into_iter().map(Self::Object).collect())
    }
}

impl<B: Backend> From<Vec<RawConfig<B>>> for RawConfig<B> {
    fn from(configs: Vec<RawConfig<B>>) -> Self {
        Self::List(configs)
    }
}

impl<B: Backend> From<Option<RawConfig<B>>> for RawConfig<B> {
    fn from(config: Option<RawConfig<B>>) -> Self {
        config.unwrap_or(Self::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::TextBackend;
    use serde_json::json;

    type Config = ViewConfig<TextBackend>;

    #[test]
    fn class_names_survive_json_and_nesting() {
        let config = Config::from_json(
            json!({"view": "block", "className": "wide", "content": {"view": "text", "className": "=kind"}})
                .as_object()
                .cloned()
                .unwrap_or_default(),
        );
        assert_eq!(config.class_name.as_deref().and_then(PropValue::as_json), Some(&json!("wide")));

        let nested = Config::named("block").with_prop("content", PropValue::Config(RawConfig::from(config.clone())));
        let outer = nested.with_class("outer");
        assert_eq!(outer.to_json()["className"], json!("outer"));
        assert_eq!(outer.to_json()["content"]["className"], json!("wide"));
    }
}
