//! Minimal path-based query engine.
//!
//! Supported forms:
//!
//! - `""`, `$` - the current data
//! - `#` - the context; `#.a.b` - a path inside the context
//! - `a.b[0].c`, `$.a` - a path inside the data; a name applied to an array
//!   maps over its items and flattens the results
//! - JSON literals (`1`, `true`, `"text"`, `[1, 2]`) and `'single quoted'` strings
//! - `!expr` - negated truthiness
//! - `a = b`, `a != b` - equality of two sub-expressions
//!
//! Anything beyond this belongs to a real query language plugged in through
//! [`QueryEngine`].

use super::{truthy, LiteralField, QueryEngine, QueryFuture};
use crate::domain::{DashviewError, Result};
use futures_util::future::{self, FutureExt};
use serde_json::Value;

/// Path and literal evaluator.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathQuery;

impl PathQuery {
    /// Evaluates `expr` synchronously.
    ///
    /// # Errors
    ///
    /// Returns [`DashviewError::Query`] for malformed paths.
    pub fn evaluate(expr: &str, data: &Value, context: &Value) -> Result<Value> {
        let expr = expr.trim();

        if let Some(rest) = expr.strip_prefix('!') {
            if !rest.starts_with('=') {
                let value = Self::evaluate(rest, data, context)?;
                return Ok(Value::Bool(!truthy(&value)));
            }
        }

        if let Some((left, negate, right)) = split_equality(expr) {
            let left = Self::evaluate(left, data, context)?;
            let right = Self::evaluate(right, data, context)?;
            return Ok(Value::Bool((left == right) != negate));
        }

        if expr.is_empty() || expr == "$" {
            return Ok(data.clone());
        }
        if expr == "#" {
            return Ok(context.clone());
        }
        if let Some(text) = single_quoted(expr) {
            return Ok(Value::String(text.to_string()));
        }
        if let Ok(literal) = serde_json::from_str::<Value>(expr) {
            return Ok(literal);
        }

        if let Some(path) = expr.strip_prefix("#.") {
            return resolve_path(path, context);
        }
        if let Some(path) = expr.strip_prefix("$.") {
            return resolve_path(path, data);
        }
        resolve_path(expr, data)
    }
}

impl QueryEngine for PathQuery {
    fn query(&self, expr: &str, data: &Value, context: &Value) -> QueryFuture {
        future::ready(Self::evaluate(expr, data, context)).boxed_local()
    }

    fn parse_literal(&self, source: &str) -> Result<Vec<LiteralField>> {
        let source = source.trim();
        let inner = source
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .ok_or_else(|| DashviewError::Query(format!("object literal expected: {source}")))?;

        let mut fields = Vec::new();
        for entry in split_top_level(inner, ',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let Some((key, value)) = split_once_top_level(entry, ':') else {
                // `{name}` is shorthand for `{name: name}`
                if is_identifier(entry) {
                    fields.push(LiteralField {
                        key: entry.to_string(),
                        source: entry.to_string(),
                        literal: None,
                    });
                    continue;
                }
                return Err(DashviewError::Query(format!("bad literal entry: {entry}")));
            };

            let key = unquote_key(key.trim())?;
            let source = value.trim().to_string();
            if source.is_empty() {
                return Err(DashviewError::Query(format!("missing value for `{key}`")));
            }
            let literal = single_quoted(&source)
                .map(|text| Value::String(text.to_string()))
                .or_else(|| serde_json::from_str(&source).ok());
            fields.push(LiteralField {
                key,
                source,
                literal,
            });
        }
        Ok(fields)
    }
}

fn resolve_path(path: &str, root: &Value) -> Result<Value> {
    let mut current = root.clone();
    for segment in path.split('.') {
        let (name, indexes) = parse_segment(segment)?;
        if !name.is_empty() {
            current = get_property(&current, name);
        }
        for index in indexes {
            current = current.get(index).cloned().unwrap_or(Value::Null);
        }
    }
    Ok(current)
}

fn get_property(value: &Value, name: &str) -> Value {
    match value {
        Value::Object(fields) => fields.get(name).cloned().unwrap_or(Value::Null),
        Value::Array(items) => {
            let mut out = Vec::new();
            for item in items {
                match get_property(item, name) {
                    Value::Null => {}
                    Value::Array(nested) => out.extend(nested),
                    other => out.push(other),
                }
            }
            Value::Array(out)
        }
        _ => Value::Null,
    }
}

fn parse_segment(segment: &str) -> Result<(&str, Vec<usize>)> {
    let Some(bracket) = segment.find('[') else {
        return Ok((segment, Vec::new()));
    };
    let name = &segment[..bracket];
    let mut indexes = Vec::new();
    let mut rest = &segment[bracket..];
    while let Some(open) = rest.strip_prefix('[') {
        let close = open
            .find(']')
            .ok_or_else(|| DashviewError::Query(format!("unclosed index in `{segment}`")))?;
        let index = open[..close]
            .trim()
            .parse::<usize>()
            .map_err(|_| DashviewError::Query(format!("bad index in `{segment}`")))?;
        indexes.push(index);
        rest = &open[close + 1..];
    }
    if !rest.is_empty() {
        return Err(DashviewError::Query(format!("unexpected `{rest}` in `{segment}`")));
    }
    Ok((name, indexes))
}

fn single_quoted(expr: &str) -> Option<&str> {
    if expr.len() >= 2 && expr.starts_with('\'') && expr.ends_with('\'') {
        Some(&expr[1..expr.len() - 1])
    } else {
        None
    }
}

fn is_identifier(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn unquote_key(key: &str) -> Result<String> {
    if let Some(text) = single_quoted(key) {
        return Ok(text.to_string());
    }
    if key.starts_with('"') {
        return serde_json::from_str::<String>(key)
            .map_err(|e| DashviewError::Query(format!("bad key {key}: {e}")));
    }
    if is_identifier(key) {
        return Ok(key.to_string());
    }
    Err(DashviewError::Query(format!("bad key `{key}`")))
}

/// Finds a top-level `=`/`!=` operator, ignoring quoted text and brackets.
fn split_equality(expr: &str) -> Option<(&str, bool, &str)> {
    let bytes = expr.as_bytes();
    let mut depth = 0i32;
    let mut quote: Option<u8> = None;
    for (i, &b) in bytes.iter().enumerate() {
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'"' | b'\'' => quote = Some(b),
            b'[' | b'{' | b'(' => depth += 1,
            b']' | b'}' | b')' => depth -= 1,
            b'=' if depth == 0 && i > 0 => {
                let negate = bytes[i - 1] == b'!';
                let left_end = if negate { i - 1 } else { i };
                let right_start = if bytes.get(i + 1) == Some(&b'=') { i + 2 } else { i + 1 };
                return Some((&expr[..left_end], negate, &expr[right_start..]));
            }
            _ => {}
        }
    }
    None
}

fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '[' | '{' | '(' => depth += 1,
            ']' | '}' | ')' => depth -= 1,
            c if c == separator && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn split_once_top_level(text: &str, separator: char) -> Option<(&str, &str)> {
    let parts = split_top_level(text, separator);
    if parts.len() < 2 {
        return None;
    }
    let key_len = parts[0].len();
    Some((&text[..key_len], &text[key_len + separator.len_utf8()..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eval(expr: &str, data: &Value) -> Value {
        PathQuery::evaluate(expr, data, &json!({"page": "home"})).unwrap()
    }

    #[test]
    fn paths_and_roots() {
        let data = json!({"user": {"name": "ann", "tags": ["a", "b"]}});
        assert_eq!(eval("user.name", &data), json!("ann"));
        assert_eq!(eval("user.tags[1]", &data), json!("b"));
        assert_eq!(eval("$", &data), data);
        assert_eq!(eval("#.page", &data), json!("home"));
        assert_eq!(eval("missing.deep", &data), Value::Null);
    }

    #[test]
    fn names_map_over_arrays() {
        let data = json!({"items": [{"id": 1}, {"id": 2}, {}]});
        assert_eq!(eval("items.id", &data), json!([1, 2]));
    }

    #[test]
    fn literals_negation_and_equality() {
        let data = json!({"kind": "a", "n": 0});
        assert_eq!(eval("42", &data), json!(42));
        assert_eq!(eval("'hi'", &data), json!("hi"));
        assert_eq!(eval("!n", &data), json!(true));
        assert_eq!(eval("kind = 'a'", &data), json!(true));
        assert_eq!(eval("kind != 'a'", &data), json!(false));
    }

    #[test]
    fn parses_object_literals() {
        let fields = PathQuery
            .parse_literal("{text: 'hello', when: user.active, limit: 5, name}")
            .unwrap();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0].literal, Some(json!("hello")));
        assert_eq!(fields[1].source, "user.active");
        assert_eq!(fields[1].literal, None);
        assert_eq!(fields[2].literal, Some(json!(5)));
        assert_eq!(fields[3].key, "name");
    }

    #[test]
    fn rejects_broken_literals() {
        assert!(PathQuery.parse_literal("{text: }").is_err());
        assert!(PathQuery.parse_literal("text: 1").is_err());
    }
}
