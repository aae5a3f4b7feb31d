//! Structured logging to stderr.
//!
//! `RUST_LOG` selects levels (default `info`, or `warn` under `--quiet`).
//! Setting `TAG_INVENTORY_LOG_JSON` switches to one JSON object per line.

use tracing_subscriber::EnvFilter;

pub(crate) const JSON_ENV: &str = "TAG_INVENTORY_LOG_JSON";

pub(crate) fn init(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // A subscriber may already be installed; keep it.
    let _ = if std::env::var_os(JSON_ENV).is_some() {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
