//! Entity markers and the lookup interface used for value annotation.
//!
//! The registry of object markers lives outside this crate. Renderers only
//! consume it through [`EntityLookup`]; how a value is matched to an entity is
//! the implementor's business.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Annotation attached to a value that denotes a known entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    /// Entity type, e.g. `"package"` or `"user"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Human readable title.
    pub title: String,
    /// Optional link to the entity page.
    #[serde(default)]
    pub href: Option<String>,
}

/// Resolves values to entity markers.
pub trait EntityLookup {
    /// Returns the marker for `value`, or `None` when it is not an entity.
    fn lookup(&self, value: &Value) -> Option<Marker>;
}

/// Lookup that never matches.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLookup;

impl EntityLookup for NoLookup {
    fn lookup(&self, _value: &Value) -> Option<Marker> {
        None
    }
}

/// Lookup backed by a closure.
///
/// # Examples
///
/// ```
/// use dashview::domain::{EntityLookup, FnLookup, Marker};
/// use serde_json::json;
///
/// let lookup = FnLookup(|value: &serde_json::Value| {
///     value.get("pkg").and_then(|v| v.as_str()).map(|name| Marker {
///         kind: "package".into(),
///         title: name.into(),
///         href: Some(format!("#package:{name}")),
///     })
/// });
///
/// assert_eq!(lookup.lookup(&json!({"pkg": "left-pad"})).unwrap().title, "left-pad");
/// assert!(lookup.lookup(&json!(1)).is_none());
/// ```
pub struct FnLookup<F>(pub F);

impl<F> EntityLookup for FnLookup<F>
where
    F: Fn(&Value) -> Option<Marker>,
{
    fn lookup(&self, value: &Value) -> Option<Marker> {
        (self.0)(value)
    }
}
