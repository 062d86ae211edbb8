//! Structured logging.
//!
//! Every layer of the crate logs through `tracing` macros: pipeline state
//! changes at `debug`, definition problems at `warn`, contained render failures
//! at `error`. Nothing is printed unless the host installs a subscriber, either
//! its own or the one from [`init_tracing`].
//!
//! The filter is resolved as:
//! 1. `RUST_LOG` environment variable (highest priority)
//! 2. `trace_level` from [`Settings`](crate::Settings)
//! 3. Default: `"info"`
//!
//! ```rust
//! use dashview::observability::init_tracing;
//! use dashview::Settings;
//!
//! init_tracing(&Settings::default());
//! tracing::debug!("renderer ready");
//! ```

mod init;

pub use init::{filter_directive, init_tracing};
