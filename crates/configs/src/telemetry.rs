//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::LoggingConfig;

/// Installs the global fmt subscriber.
///
/// `RUST_LOG` wins over the configured level. Returns `false` when a
/// subscriber was already installed (e.g., by an earlier test).
pub fn init(config: &LoggingConfig) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = if config.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    if installed {
        tracing::debug!(level = %config.level, json = config.json, "tracing initialised");
    }
    installed
}
