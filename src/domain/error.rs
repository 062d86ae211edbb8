//! Error types for the dashview renderer.
//!
//! This module defines the centralized error type [`DashviewError`] and a type alias
//! [`Result`] for convenient error handling throughout the crate. All errors are
//! implemented using the `thiserror` crate for automatic `Error` trait implementation.
//!
//! Most of these errors never escape a `render()` call: the pipeline catches them at
//! the placeholder boundary and renders them inline (see [`crate::pipeline`]).
//! They surface as values only from definition-time and settings APIs.

use thiserror::Error;

/// The main error type for dashview operations.
///
/// # Examples
///
/// ```
/// use dashview::DashviewError;
///
/// fn lookup(name: &str) -> Result<(), DashviewError> {
///     Err(DashviewError::Lookup(name.to_string()))
/// }
///
/// assert_eq!(
///     lookup("badge").unwrap_err().to_string(),
///     "View `badge` is not found"
/// );
/// ```
#[derive(Debug, Clone, Error)]
pub enum DashviewError {
    /// Raw config is malformed.
    ///
    /// Missing `view`, an object literal that fails to parse, or a forbidden
    /// literal key such as `view` or `postRender`.
    #[error("Config error: {0}")]
    Config(String),

    /// A named view is not registered.
    #[error("View `{0}` is not found")]
    Lookup(String),

    /// A view, `data`, `when` or `whenData` failed while rendering.
    #[error("Render error: {0}")]
    Render(String),

    /// The query engine rejected or failed to evaluate an expression.
    #[error("Query error: {0}")]
    Query(String),

    /// A view definition is invalid (duplicate name, bad options).
    #[error("Definition error: {0}")]
    Definition(String),

    /// Filesystem or I/O operation failed.
    ///
    /// Stored as a string so the error stays `Clone`; render failures are
    /// attached to several nodes at once.
    #[error("IO error: {0}")]
    Io(String),

    /// Settings could not be parsed.
    #[error("Settings error: {0}")]
    Settings(String),
}

impl DashviewError {
    /// Short machine-friendly kind, used as a CSS class suffix and text marker.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Lookup(_) => "lookup",
            Self::Render(_) => "render",
            Self::Query(_) => "query",
            Self::Definition(_) => "definition",
            Self::Io(_) => "io",
            Self::Settings(_) => "settings",
        }
    }
}

impl From<std::io::Error> for DashviewError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<toml::de::Error> for DashviewError {
    fn from(error: toml::de::Error) -> Self {
        Self::Settings(error.to_string())
    }
}

/// A specialized `Result` type for dashview operations.
pub type Result<T> = std::result::Result<T, DashviewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(DashviewError::Config("x".into()).kind(), "config");
        assert_eq!(DashviewError::Render("x".into()).kind(), "render");
    }

    #[test]
    fn io_errors_convert() {
        let err: DashviewError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, DashviewError::Io(ref msg) if msg == "gone"));
    }
}
