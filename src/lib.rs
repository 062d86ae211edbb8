//! Dashview: declarative view rendering for data-exploration dashboards.
//!
//! A page is described by *configs*: strings like `"badge:count"`, objects like
//! `{"view": "list", "data": "items", "limit": 10}`, inline render functions,
//! or arrays of those. A renderer turns configs plus input data into output
//! nodes by looking views up in its registry and driving each config through
//! the same pipeline:
//!
//! - conditional rendering (`when`, `whenData`)
//! - data derivation (`data`) through a pluggable query engine
//! - per-render props computed from the remaining config keys
//! - asynchronous view bodies that splice into pre-reserved placeholders
//! - in-place error rendering that never breaks siblings
//!
//! Two backends ship with the crate: an in-memory DOM ([`dom`]) and a
//! text/box layout engine ([`text`]).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Configs (config/)                                  │  ← Normalization
//! │  - shorthand parsing, composition, error configs    │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Pipeline (pipeline/)                               │  ← State machine
//! │  - placeholders, when/data/whenData, props          │
//! │  - error containment, lists, stale requests         │
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ Views (view/) │   │ Props         │   │ Queries       │
//! │ - registry    │   │ (props.rs)    │   │ (query/)      │
//! │ - options     │   │ - `=` queries │   │ - PathQuery   │
//! └───────────────┘   └───────────────┘   └───────────────┘
//!         │                                         │
//! ┌───────────────────────────┐   ┌───────────────────────────┐
//! │ DOM backend (dom/)        │   │ Text backend (text/)      │
//! │ - comments, fragments     │   │ - boxes, borders          │
//! │ - classes, tooltips       │   │ - line serialization      │
//! └───────────────────────────┘   └───────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use dashview::text::{BoxType, TextBackend, TextRenderer};
//! use futures::executor::block_on;
//! use serde_json::json;
//!
//! let backend = TextBackend::new();
//! let renderer = TextRenderer::builder(backend.clone()).build();
//! let root = backend.root(BoxType::Block);
//!
//! let page = json!([
//!     {"view": "line", "content": "text:\"Packages\""},
//!     {"view": "list", "data": "packages", "item": "text:name"},
//! ]);
//! let data = json!({"packages": [{"name": "serde"}, {"name": "toml"}]});
//! block_on(renderer.render(&root, page, data, json!({})));
//!
//! assert_eq!(backend.serialize(&root), "Packages\n\n- serde\n- toml");
//! ```
//!
//! # Configuration
//!
//! Renderer-wide [`Settings`] come from a string map (host configuration) or
//! a TOML file:
//!
//! ```toml
//! default_list_limit = 25
//! class_prefix = "view-"
//! trace_level = "info"
//! ```

#![allow(clippy::multiple_crate_versions)]

pub mod config;
pub mod dom;
pub mod domain;
pub mod infrastructure;
pub mod observability;
pub mod pipeline;
pub mod props;
pub mod query;
pub mod text;
pub mod view;

pub use config::{Handler, PropValue, RawConfig, ViewConfig, ViewRef};
pub use domain::{DashviewError, EntityLookup, FnLookup, Marker, Result};
pub use pipeline::{Backend, RenderOutcome, Renderer, RequestTracker};
pub use props::Props;
pub use query::{PathQuery, Query, QueryEngine};
pub use view::{RenderCall, RenderFn, ViewOptions};

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

const DEFAULT_LIST_LIMIT: Option<usize> = Some(25);

/// Renderer-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Page size of list views without a `limit` prop. `None` renders
    /// everything. Default: `Some(25)`
    #[serde(deserialize_with = "deserialize_limit")]
    pub default_list_limit: Option<usize>,

    /// Prefix of the CSS class derived from a view name. Default: `"view-"`
    pub class_prefix: String,

    /// Tracing filter directive, e.g. `"debug"` or `"dashview=trace"`.
    pub trace_level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_list_limit: DEFAULT_LIST_LIMIT,
            class_prefix: "view-".to_string(),
            trace_level: None,
        }
    }
}

fn deserialize_limit<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<usize>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(parse_limit(&value))
}

/// `false`, `"none"` and `"unlimited"` disable paging.
fn parse_limit(value: &Value) -> Option<usize> {
    match value {
        Value::String(text) if matches!(text.trim(), "false" | "none" | "unlimited") => None,
        other => pipeline::list_limit(Some(other), DEFAULT_LIST_LIMIT),
    }
}

impl Settings {
    /// Parses settings from a host-provided string map.
    ///
    /// # Parsing Rules
    ///
    /// - `default_list_limit`: positive integer, or `false`/`none`/`unlimited`
    ///   for no limit (falls back to 25 on anything else)
    /// - `class_prefix`: used as is
    /// - `trace_level`: used as is
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use dashview::Settings;
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("default_list_limit".to_string(), "false".to_string());
    /// map.insert("class_prefix".to_string(), "dv-".to_string());
    ///
    /// let settings = Settings::from_map(&map);
    /// assert_eq!(settings.default_list_limit, None);
    /// assert_eq!(settings.class_prefix, "dv-");
    /// ```
    #[must_use]
    pub fn from_map(config: &BTreeMap<String, String>) -> Self {
        let default_list_limit = config
            .get("default_list_limit")
            .map_or(DEFAULT_LIST_LIMIT, |text| parse_limit(&Value::String(text.clone())));

        Self {
            default_list_limit,
            class_prefix: config
                .get("class_prefix")
                .cloned()
                .unwrap_or_else(|| "view-".to_string()),
            trace_level: config.get("trace_level").cloned(),
        }
    }

    /// Parses settings from TOML; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`DashviewError::Settings`] when the TOML is malformed or a key
    /// has the wrong type.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Loads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`DashviewError::Io`] when the file cannot be read and
    /// [`DashviewError::Settings`] when it cannot be parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&contents)?;
        tracing::debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }
}
