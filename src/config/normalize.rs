//! Config normalization and composition.

use super::{PropValue, RawConfig, ViewConfig};
use crate::domain::DashviewError;
use crate::pipeline::Backend;
use crate::query::{Query, QueryEngine};
use serde_json::Value;

/// Canonicalizes any raw config into a flat list of object configs.
///
/// `Null` yields an empty list, lists are flattened, functions and strings are
/// wrapped, objects are returned unchanged. Malformed input becomes an error
/// config in place so siblings still render.
///
/// # Examples
///
/// ```
/// use dashview::config::{normalize_config, RawConfig};
/// use dashview::query::PathQuery;
/// use dashview::text::TextBackend;
///
/// let configs = normalize_config::<TextBackend>(&PathQuery, RawConfig::from("badge:count"));
/// assert_eq!(configs.len(), 1);
/// assert_eq!(configs[0].view_name(), Some("badge"));
/// ```
pub fn normalize_config<B: Backend>(engine: &dyn QueryEngine, raw: RawConfig<B>) -> Vec<ViewConfig<B>> {
    match raw {
        RawConfig::Null => Vec::new(),
        RawConfig::List(items) => items
            .into_iter()
            .flat_map(|item| normalize_config(engine, item))
            .collect(),
        RawConfig::Inline(render) => vec![ViewConfig::inline(render)],
        RawConfig::Object(config) => vec![config],
        RawConfig::Text(text) => vec![parse_shorthand(engine, &text)],
        RawConfig::Invalid(value) => vec![ViewConfig::failure(
            DashviewError::Config(format!("unsupported config value: {value}")),
            value,
        )],
    }
}

/// Replaces a config lacking a `view` with an error config.
#[must_use]
pub fn ensure_valid_config<B: Backend>(config: ViewConfig<B>) -> ViewConfig<B> {
    if config.view.is_some() {
        return config;
    }
    let offending = config.to_json();
    ViewConfig::failure(
        DashviewError::Config("config is missing a `view`".to_string()),
        offending,
    )
}

/// Shallow-merges `extension` into every config of `base`; extension wins.
///
/// Lets a parent inject handlers or defaults into a child config without
/// discarding the child's own behaviour. An empty `base` yields the extension
/// alone.
pub fn compose_config<B: Backend>(
    engine: &dyn QueryEngine,
    base: RawConfig<B>,
    extension: &ViewConfig<B>,
) -> RawConfig<B> {
    let mut configs = normalize_config(engine, base);
    if configs.is_empty() {
        return RawConfig::Object(extension.clone());
    }
    for config in &mut configs {
        merge_into(config, extension);
    }
    if configs.len() == 1 {
        configs.pop().map_or(RawConfig::Null, RawConfig::Object)
    } else {
        RawConfig::from(configs)
    }
}

fn merge_into<B: Backend>(target: &mut ViewConfig<B>, extension: &ViewConfig<B>) {
    if let Some(view) = &extension.view {
        target.view = Some(view.clone());
    }
    if let Some(when) = &extension.when {
        target.when = Some(when.clone());
    }
    if let Some(data) = &extension.data {
        target.data = Some(data.clone());
    }
    if let Some(when_data) = &extension.when_data {
        target.when_data = Some(when_data.clone());
    }
    if let Some(post_render) = &extension.post_render {
        target.post_render = Some(post_render.clone());
    }
    if let Some(class_name) = &extension.class_name {
        target.class_name = Some(class_name.clone());
    }
    for (key, value) in extension.props.iter() {
        target.props.insert(key.clone(), value.clone());
    }
}

/// Splits `name:query` / `name{literal}` into prefix, separator and remainder.
fn split_shorthand(text: &str) -> Option<(&str, char, &str)> {
    for (index, c) in text.char_indices() {
        if c.is_whitespace() {
            return None;
        }
        if (c == ':' || c == '{') && index > 0 {
            let rest = &text[index + 1..];
            if rest.is_empty() {
                return None;
            }
            return Some((&text[..index], c, rest));
        }
    }
    None
}

fn parse_shorthand<B: Backend>(engine: &dyn QueryEngine, text: &str) -> ViewConfig<B> {
    let Some((name, separator, rest)) = split_shorthand(text) else {
        return ViewConfig::named(text);
    };

    if separator == ':' {
        return ViewConfig::named(name).with_data(rest);
    }

    let fields = match engine.parse_literal(&format!("{{{rest}")) {
        Ok(fields) => fields,
        Err(error) => {
            return ViewConfig::failure(
                DashviewError::Config(format!("bad config literal: {error}")),
                Value::String(text.to_string()),
            );
        }
    };

    let mut config = ViewConfig::named(name);
    for field in fields {
        match field.key.as_str() {
            "view" | "postRender" => {
                return ViewConfig::failure(
                    DashviewError::Config(format!("`{}` is not allowed in a config literal", field.key)),
                    Value::String(text.to_string()),
                );
            }
            "when" | "data" | "whenData" => {
                let query = match field.literal {
                    Some(value) if !value.is_string() => Query::Value(value),
                    _ => Query::Text(field.source),
                };
                match field.key.as_str() {
                    "when" => config.when = Some(query),
                    "data" => config.data = Some(query),
                    _ => config.when_data = Some(query),
                }
            }
            "className" => config.class_name = Some(Box::new(literal_prop(field.literal, &field.source))),
            _ => {
                let value = literal_prop(field.literal, &field.source);
                config.props.insert(field.key, value);
            }
        }
    }
    config
}

/// Literal values stay as-is; expressions are deferred as `=`-queries.
fn literal_prop<B: Backend>(literal: Option<Value>, source: &str) -> PropValue<B> {
    match literal {
        Some(value) => PropValue::Json(value),
        None => PropValue::Json(Value::String(format!("={source}"))),
    }
}
