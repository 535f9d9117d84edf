//! Logging init: env-filtered tracing to stderr.
//!
//! Stdout stays reserved for user-facing lines (the final summary); retry
//! warnings and skip notices go to stderr so the operator sees them live
//! even when output is redirected.

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the CLI. `RUST_LOG` overrides the default filter.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,megaq_core=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
