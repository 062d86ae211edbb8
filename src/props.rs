//! Render props and their derivation from configs.
//!
//! [`props_from_config`] materializes the property bag a view receives: every
//! prop is copied as-is, except strings starting with `=` which are evaluated
//! as queries against the current data and context. A view may then reshape
//! the bag with its declared props transform.

use crate::config::{Handler, PropValue, RawConfig, ViewConfig};
use crate::domain::{DashviewError, Result};
use crate::pipeline::Backend;
use crate::query::{self, QueryEngine};
use crate::view::PropsTransform;
use futures_util::future::try_join_all;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Property bag passed to a view's render function.
#[derive(Clone, Debug)]
pub struct Props<B: Backend> {
    values: BTreeMap<String, PropValue<B>>,
}

impl<B: Backend> Default for Props<B> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }
}

impl<B: Backend> Props<B> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropValue<B>>) {
        self.values.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PropValue<B>> {
        self.values.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<PropValue<B>> {
        self.values.remove(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    #[must_use]
    pub fn json(&self, key: &str) -> Option<&Value> {
        self.values.get(key).and_then(PropValue::as_json)
    }

    #[must_use]
    pub fn str(&self, key: &str) -> Option<&str> {
        self.json(key).and_then(Value::as_str)
    }

    /// Nested config stored under `key`, whether given as JSON or typed.
    #[must_use]
    pub fn config(&self, key: &str) -> Option<RawConfig<B>> {
        match self.values.get(key)? {
            PropValue::Json(value) => Some(RawConfig::from(value.clone())),
            PropValue::Config(config) => Some(config.clone()),
            PropValue::Handler(_) => None,
        }
    }

    #[must_use]
    pub fn handler(&self, key: &str) -> Option<&Handler> {
        match self.values.get(key)? {
            PropValue::Handler(handler) => Some(handler),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropValue<B>)> {
        self.values.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// JSON view of the props; handlers are left out.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let fields: Map<String, Value> = self
            .values
            .iter()
            .filter_map(|(key, value)| value.to_json().map(|json| (key.clone(), json)))
            .collect();
        Value::Object(fields)
    }
}

impl<B: Backend> FromIterator<(String, PropValue<B>)> for Props<B> {
    fn from_iter<I: IntoIterator<Item = (String, PropValue<B>)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Computes the props of `config` against `data` and `context`.
///
/// `transform` is the view's declared props transform, if any. It runs as
/// `(data, {props, context})`; a non-null object result replaces the props.
///
/// # Errors
///
/// Fails when a `=` query or the transform fails to evaluate.
pub async fn props_from_config<B: Backend>(
    engine: Rc<dyn QueryEngine>,
    config: &ViewConfig<B>,
    transform: Option<&PropsTransform<B>>,
    data: &Value,
    context: &Value,
) -> Result<Props<B>> {
    let pending = config.props.iter().map(|(key, value)| {
        let key = key.clone();
        let value = value.clone();
        let evaluation = match &value {
            PropValue::Json(Value::String(text)) if text.starts_with('=') => {
                Some(engine.query(&text[1..], data, context))
            }
            _ => None,
        };
        async move {
            let value = match evaluation {
                Some(future) => PropValue::Json(future.await?),
                None => value,
            };
            Ok::<_, DashviewError>((key, value))
        }
    });
    let props: Props<B> = try_join_all(pending).await?.into_iter().collect();

    match transform {
        None => Ok(props),
        Some(PropsTransform::Map(map)) => Ok(map(data, props.clone(), context).unwrap_or(props)),
        Some(PropsTransform::Query(query)) => {
            let input = serde_json::json!({
                "props": props.to_json(),
                "context": context,
            });
            let result = query::run(&engine, query, data, &input).await?;
            let Value::Object(fields) = result else {
                return Ok(props);
            };
            // handlers cannot round-trip through JSON; keep them unless replaced
            let mut reshaped: Props<B> = fields
                .into_iter()
                .map(|(key, value)| (key, PropValue::Json(value)))
                .collect();
            for (key, value) in props.iter() {
                if matches!(value, PropValue::Handler(_)) && !reshaped.contains(key) {
                    reshaped.insert(key.clone(), value.clone());
                }
            }
            Ok(reshaped)
        }
    }
}

/// Evaluates a `className` setting into a list of class names.
///
/// Accepts a string (space separated), an array of strings, or an `=` query
/// producing either.
///
/// # Errors
///
/// Fails when the query fails.
pub async fn class_names<B: Backend>(
    engine: Rc<dyn QueryEngine>,
    class_name: Option<&PropValue<B>>,
    data: &Value,
    context: &Value,
) -> Result<Vec<String>> {
    let value = match class_name.and_then(PropValue::as_json) {
        None => return Ok(Vec::new()),
        Some(Value::String(text)) if text.starts_with('=') => {
            engine.query(&text[1..], data, context).await?
        }
        Some(value) => value.clone(),
    };
    let names = match value {
        Value::String(text) => text.split_whitespace().map(String::from).collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .flat_map(str::split_whitespace)
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    };
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{PathQuery, Query};
    use crate::text::TextBackend;
    use futures::executor::block_on;
    use serde_json::json;

    type Config = ViewConfig<TextBackend>;

    fn engine() -> Rc<dyn QueryEngine> {
        Rc::new(PathQuery)
    }

    #[test]
    fn copies_plain_props_and_evaluates_queries() {
        let config = Config::named("badge")
            .with_prop("text", "=user.name")
            .with_prop("color", "red")
            .with_prop("count", json!(3))
            .with_data("user");

        let props = block_on(props_from_config(
            engine(),
            &config,
            None,
            &json!({"user": {"name": "ann"}}),
            &json!(null),
        ))
        .unwrap();

        assert_eq!(props.str("text"), Some("ann"));
        assert_eq!(props.str("color"), Some("red"));
        assert_eq!(props.json("count"), Some(&json!(3)));
        assert!(!props.contains("data"));
        assert!(!props.contains("view"));
    }

    #[test]
    fn query_transform_replaces_props() {
        let config = Config::named("badge").with_prop("label", "x");
        let transform = PropsTransform::Query(Query::func(|data, input| {
            Ok(json!({"text": input["props"]["label"], "value": data}))
        }));
        let props = block_on(props_from_config(engine(), &config, Some(&transform), &json!(7), &json!({})))
            .unwrap();
        assert_eq!(props.str("text"), Some("x"));
        assert_eq!(props.json("value"), Some(&json!(7)));
        assert!(!props.contains("label"));
    }

    #[test]
    fn null_transform_result_keeps_props() {
        let config = Config::named("badge").with_prop("label", "x");
        let transform = PropsTransform::Query(Query::Value(Value::Null));
        let props = block_on(props_from_config(engine(), &config, Some(&transform), &json!(1), &json!({})))
            .unwrap();
        assert_eq!(props.str("label"), Some("x"));
    }

    #[test]
    fn map_transform_normalizes_shorthand() {
        let config = Config::named("badge").with_prop("text", "short");
        let transform = PropsTransform::map(|_data, mut props: Props<TextBackend>, _context| {
            let text = props.str("text")?.to_uppercase();
            props.insert("text", Value::String(text));
            Some(props)
        });
        let props = block_on(props_from_config(engine(), &config, Some(&transform), &json!(1), &json!({})))
            .unwrap();
        assert_eq!(props.str("text"), Some("SHORT"));
    }

    #[test]
    fn class_names_accept_strings_arrays_and_queries() {
        let run = |value: PropValue<TextBackend>| {
            block_on(class_names(engine(), Some(&value), &json!({"kind": "warn"}), &json!({})))
                .unwrap()
        };
        assert_eq!(run("a b".into()), ["a", "b"]);
        assert_eq!(run(json!(["a", "b c"]).into()), ["a", "b", "c"]);
        assert_eq!(run("=kind".into()), ["warn"]);
    }
}
