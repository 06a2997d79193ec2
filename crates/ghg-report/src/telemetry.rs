//! Tracing initialization

use std::sync::Once;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Default filter when `RUST_LOG` is unset or invalid
pub const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber
///
/// Reads `RUST_LOG` (falling back to [`DEFAULT_FILTER`]). With `json` set,
/// events are written as one JSON object per line. Later calls are no-ops.
/// Returns whether this call installed the subscriber.
pub fn init_tracing(json: bool) -> bool {
    let mut installed_here = false;
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let registry = tracing_subscriber::registry().with(filter);
        let installed = if json {
            registry.with(fmt::layer().json().with_target(true)).try_init()
        } else {
            registry.with(fmt::layer().with_target(true)).try_init()
        };
        match installed {
            Ok(()) => installed_here = true,
            Err(e) => tracing::debug!(error = %e, "global subscriber already set, keeping it"),
        }
    });
    installed_here
}
