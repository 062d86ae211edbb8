//! Query evaluation interface.
//!
//! The query language itself is an external collaborator: this crate only
//! consumes it through [`QueryEngine`]. Config fields that carry queries
//! (`data`, `when`, `whenData`, `=`-prefixed props, string `props` transforms)
//! are represented as [`Query`] values and evaluated through the engine owned by
//! the renderer.
//!
//! Every evaluation returns a [`QueryFuture`]. Engines that answer immediately
//! wrap their value in a ready future; engines that need to fetch or compute
//! lazily suspend the render pipeline at that point.
//!
//! A small default engine, [`PathQuery`], understands property paths and JSON
//! literals, which is enough for tests and simple dashboards.

mod path;

pub use path::PathQuery;

use crate::domain::Result;
use futures_util::future::{self, FutureExt, LocalBoxFuture};
use serde_json::Value;
use std::fmt;
use std::rc::Rc;

/// Deferred query result.
pub type QueryFuture = LocalBoxFuture<'static, Result<Value>>;

/// Query implemented as a function of `(data, context)`.
pub type QueryFn = Rc<dyn Fn(&Value, &Value) -> QueryFuture>;

/// A query as it appears in a config.
#[derive(Clone)]
pub enum Query {
    /// Expression text, handed to the engine.
    Text(String),
    /// Literal value, returned unchanged.
    Value(Value),
    /// Function evaluated against `(data, context)`.
    Fn(QueryFn),
}

impl Query {
    /// Wraps a synchronous function.
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&Value, &Value) -> Result<Value> + 'static,
    {
        Self::Fn(Rc::new(move |data, context| {
            future::ready(f(data, context)).boxed_local()
        }))
    }

    /// Wraps a function returning a future.
    pub fn deferred<F, Fut>(f: F) -> Self
    where
        F: Fn(&Value, &Value) -> Fut + 'static,
        Fut: std::future::Future<Output = Result<Value>> + 'static,
    {
        Self::Fn(Rc::new(move |data, context| f(data, context).boxed_local()))
    }

    /// JSON strings are query text; anything else is a literal.
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            other => Self::Value(other),
        }
    }

    /// JSON form, if the query has one.
    #[must_use]
    pub fn to_json(&self) -> Option<Value> {
        match self {
            Self::Text(text) => Some(Value::String(text.clone())),
            Self::Value(value) => Some(value.clone()),
            Self::Fn(_) => None,
        }
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Fn(_) => f.write_str("Fn(..)"),
        }
    }
}

impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Value(a), Self::Value(b)) => a == b,
            (Self::Fn(a), Self::Fn(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for Query {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Query {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// One field of a parsed object literal.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralField {
    /// Field name.
    pub key: String,
    /// Source text of the field value.
    pub source: String,
    /// Parsed value when the source is a plain literal.
    pub literal: Option<Value>,
}

/// External query language.
pub trait QueryEngine {
    /// Evaluates `expr` against `data` and `context`.
    fn query(&self, expr: &str, data: &Value, context: &Value) -> QueryFuture;

    /// Parses an object literal such as `{text: name, when: active}`.
    ///
    /// # Errors
    ///
    /// Returns an error when the source is not a well-formed object literal.
    fn parse_literal(&self, source: &str) -> Result<Vec<LiteralField>>;

    /// Truthiness used by `when`/`whenData`.
    fn is_truthy(&self, value: &Value) -> bool {
        truthy(value)
    }
}

/// Default truthiness: `null`, `false`, `0`, `""`, `[]` and `{}` are false.
#[must_use]
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// Text shown for a value: strings verbatim, `null` as nothing, JSON otherwise.
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Evaluates `query` through `engine`.
pub fn run(engine: &Rc<dyn QueryEngine>, query: &Query, data: &Value, context: &Value) -> QueryFuture {
    match query {
        Query::Text(text) => engine.query(text, data, context),
        Query::Value(value) => future::ready(Ok(value.clone())).boxed_local(),
        Query::Fn(f) => f(data, context),
    }
}

/// Evaluates `query` and applies the engine's truthiness.
pub fn run_bool(
    engine: &Rc<dyn QueryEngine>,
    query: &Query,
    data: &Value,
    context: &Value,
) -> LocalBoxFuture<'static, Result<bool>> {
    let truthiness = Rc::clone(engine);
    run(engine, query, data, context)
        .map(move |result| result.map(|value| truthiness.is_truthy(&value)))
        .boxed_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use serde_json::json;

    #[test]
    fn truthiness_treats_empty_collections_as_false() {
        assert!(!truthy(&json!([])));
        assert!(!truthy(&json!({})));
        assert!(!truthy(&json!(0)));
        assert!(truthy(&json!([0])));
        assert!(truthy(&json!("0")));
    }

    #[test]
    fn display_value_unquotes_strings() {
        assert_eq!(display_value(&json!("abc")), "abc");
        assert_eq!(display_value(&json!(null)), "");
        assert_eq!(display_value(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn literal_queries_bypass_the_engine() {
        let engine: Rc<dyn QueryEngine> = Rc::new(PathQuery);
        let value = block_on(run(&engine, &Query::Value(json!(false)), &json!(1), &json!(null)));
        assert_eq!(value.unwrap(), json!(false));
    }

    #[test]
    fn function_queries_see_data_and_context() {
        let engine: Rc<dyn QueryEngine> = Rc::new(PathQuery);
        let query = Query::func(|data, context| Ok(json!([data, context])));
        let value = block_on(run(&engine, &query, &json!(1), &json!(2))).unwrap();
        assert_eq!(value, json!([1, 2]));
    }

    #[test]
    fn run_bool_uses_engine_truthiness() {
        let engine: Rc<dyn QueryEngine> = Rc::new(PathQuery);
        let yes = block_on(run_bool(&engine, &"items".into(), &json!({"items": [1]}), &json!(null)));
        let no = block_on(run_bool(&engine, &"items".into(), &json!({"items": []}), &json!(null)));
        assert!(yes.unwrap());
        assert!(!no.unwrap());
    }
}
