//! Tracing subscriber setup.

use crate::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive used when `RUST_LOG` is unset.
#[must_use]
pub fn filter_directive(settings: &Settings) -> String {
    settings
        .trace_level
        .clone()
        .unwrap_or_else(|| "info".to_string())
}

/// Installs a global fmt subscriber filtered by `RUST_LOG` or the settings.
///
/// Idempotent: only the first call in a process takes effect, later calls
/// (or a subscriber installed by the host) win silently.
pub fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directive(settings)));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true));

    if subscriber.try_init().is_ok() {
        tracing::debug!(level = %filter_directive(settings), "tracing initialized");
    }
}
