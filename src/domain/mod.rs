//! Domain layer for the dashview renderer.
//!
//! Core types that do not depend on a particular output backend.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`marker`]: Entity markers and the lookup interface consumed for annotation

pub mod error;
pub mod marker;

pub use error::{DashviewError, Result};
pub use marker::{EntityLookup, FnLookup, Marker, NoLookup};
