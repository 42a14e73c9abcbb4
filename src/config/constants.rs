//! Configuration constants.
//!
//! Key layout, store timeouts and watch backoff parameters shared by every
//! component.

use std::time::Duration;

/// Key prefix of service descriptor records (`service.info.<serviceName>`).
///
/// Must stay bit-exact: existing deployments publish under this namespace.
pub const SERVICE_INFO_KEY_PREFIX: &str = "service.info.";

/// Key prefix of versioned configuration records
/// (`service.config.<serviceName>.<version>`).
pub const SERVICE_CONFIG_KEY_PREFIX: &str = "service.config.";

/// Uniform per-call timeout applied to one-shot store operations.
pub const STORE_OP_TIMEOUT: Duration = Duration::from_secs(5);

// Watch re-subscription backoff
/// Initial delay before re-subscribing after a closed or failed watch stream
pub const RESUBSCRIBE_INITIAL_DELAY_MS: u64 = 100;
/// Backoff multiplier between consecutive failed subscriptions
pub const RESUBSCRIBE_FACTOR: u64 = 2;
/// Upper bound on the delay between re-subscription attempts
pub const RESUBSCRIBE_MAX_DELAY_SECS: u64 = 5;

/// Buffer size of each in-memory watch stream.
pub const WATCH_CHANNEL_CAPACITY: usize = 64;

/// Environment tag used when none is configured.
pub const DEFAULT_ENVIRONMENT: &str = "pro";

/// Builds the descriptor key for a service.
pub fn service_info_key(service_name: &str) -> String {
    format!("{}{}", SERVICE_INFO_KEY_PREFIX, service_name)
}

/// Builds the versioned configuration key for a service and version.
pub fn service_config_key(service_name: &str, version: i64) -> String {
    format!("{}{}.{}", SERVICE_CONFIG_KEY_PREFIX, service_name, version)
}
