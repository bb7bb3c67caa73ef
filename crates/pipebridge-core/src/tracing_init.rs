//! Shared tracing/logging initialization.
//!
//! The daemon sets up `tracing_subscriber` with an env-filter and optional
//! JSON output through this single entry point.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialise the global tracing subscriber.
///
/// * `default_filter` -- filter applied when `RUST_LOG` is not set
///   (e.g. `"pipebridge_daemon=info"`).
/// * `log_json` -- when `true`, emit structured JSON log lines instead of the
///   human-readable format.
///
/// Exactly one of the two fmt layers is installed; an `Option` layer is a
/// no-op when `None`.
pub fn init_tracing(default_filter: &str, log_json: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(log_json.then(|| fmt::layer().json()))
        .with((!log_json).then(|| fmt::layer()))
        .init();
}
