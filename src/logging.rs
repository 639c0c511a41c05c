//! Tracing subscriber setup
//!
//! The library only emits `tracing` events. Applications that have no
//! subscriber of their own can install one from [`LoggingConfig`].

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG`, falling back to the configured level
///
/// A bare level such as `debug` applies to this crate only; anything
/// containing `=` or `,` is used as a full directive.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config.level.contains('=') || config.level.contains(',') {
            EnvFilter::new(&config.level)
        } else {
            EnvFilter::new(format!("memokit={}", config.level))
        }
    })
}

/// Install a global fmt subscriber
///
/// Returns `false` if a global subscriber was already set.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_target(false);

    let installed = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.is_ok()
}
