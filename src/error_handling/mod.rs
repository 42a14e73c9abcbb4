//! Error handling.
//!
//! This module provides:
//! - `ConfigError`, the classified failure of every one-shot operation
//! - `InitializationError` for logger and seed setup
//! - The backoff strategy used when a watch stream has to be re-established

mod types;

use std::time::Duration;

use tokio_retry::strategy::ExponentialBackoff;

// Re-export public API
pub use types::{ConfigError, InitializationError};

/// Result alias for store and configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Creates the re-subscription backoff used by the watch loop.
///
/// Returns an endless iterator of delays:
/// - Initial delay: `RESUBSCRIBE_INITIAL_DELAY_MS` milliseconds
/// - Backoff factor: `RESUBSCRIBE_FACTOR`
/// - Maximum delay: `RESUBSCRIBE_MAX_DELAY_SECS` seconds
///
/// The iterator never ends; the loop retries forever and only the cap keeps a
/// long store outage from turning into a busy loop.
pub fn resubscribe_backoff() -> impl Iterator<Item = Duration> + Send {
    // tokio-retry grows `base^n * factor`: the base is the multiplier and the
    // factor scales the first delay to the configured initial value
    ExponentialBackoff::from_millis(crate::config::RESUBSCRIBE_FACTOR)
        .factor(crate::config::RESUBSCRIBE_INITIAL_DELAY_MS / crate::config::RESUBSCRIBE_FACTOR)
        .max_delay(Duration::from_secs(crate::config::RESUBSCRIBE_MAX_DELAY_SECS))
}
