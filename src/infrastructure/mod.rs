//! Infrastructure shared by the backends.
//!
//! - [`arena`]: node arena with stable ids and side tables keyed by them

pub mod arena;

pub use arena::{NodeId, SideTable, Tree};
