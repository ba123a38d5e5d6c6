//! # Logging
//!
//! `tracing` subscriber setup for binaries and embedding apps.
//!
//! `RUST_LOG` wins over the configured filter:
//! ```text
//! RUST_LOG=debug           → everything at debug
//! (unset)                  → AppConfig::log_filter()
//!                            default "info,taproom=debug,sqlx=warn"
//! ```

use tracing::Subscriber;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` if set and valid, otherwise `fallback`.
fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// fmt subscriber gated only by `filter`.
fn subscriber(filter: EnvFilter) -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::fmt().with_env_filter(filter).finish()
}

/// Installs the global fmt subscriber.
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place.
pub fn init_tracing(filter: &str) {
    let _ = subscriber(env_filter(filter)).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_LOG_FILTER;
    use tracing::Level;

    // One test so no other scoped subscriber is registered while the
    // callsite interest is computed.
    #[test]
    fn test_filter_gates_levels_and_targets() {
        tracing::subscriber::with_default(subscriber(EnvFilter::new("warn")), || {
            assert!(tracing::enabled!(target: "till", Level::WARN));
            assert!(!tracing::enabled!(target: "till", Level::INFO));
            assert!(!tracing::enabled!(target: "sqlx", Level::TRACE));
        });

        tracing::subscriber::with_default(subscriber(EnvFilter::new(DEFAULT_LOG_FILTER)), || {
            assert!(tracing::enabled!(target: "taproom", Level::DEBUG));
            assert!(!tracing::enabled!(target: "taproom", Level::TRACE));
            assert!(tracing::enabled!(target: "sqlx", Level::WARN));
            assert!(!tracing::enabled!(target: "sqlx", Level::INFO));
            assert!(!tracing::enabled!(target: "hyper", Level::DEBUG));
        });
    }
}
