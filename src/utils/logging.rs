//! Structured logging set-up.
//!
//! Installs a `tracing-subscriber` fmt layer, plain or JSON, filtered at the
//! configured level unless `RUST_LOG` says otherwise. Safe to call more than
//! once: only the first call installs a subscriber.

use tracing::debug;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Build the filter: `RUST_LOG` wins, otherwise the configured level.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string().to_lowercase()))
}

/// Install the global subscriber. Returns `false` when one was already set.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let span_events = if config.verbose {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let installed = if config.json_format {
        tracing_subscriber::registry()
            .with(env_filter(config))
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(config.verbose)
                    .with_span_events(span_events),
            )
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::registry()
            .with(env_filter(config))
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(config.verbose)
                    .with_span_events(span_events),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        debug!(app = %config.app_name, level = %config.log_level, "Logging initialized");
    }
    installed
}
