//! Error type definitions.

use log::SetLoggerError;
use thiserror::Error;

/// Classified failures of store access, version resolution and fetching.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The store gateway is unreachable, timed out, or rejected the call.
    #[error("store unavailable while accessing {key}: {reason}")]
    StoreUnavailable {
        /// Key (or prefix) being accessed
        key: String,
        /// Underlying cause as reported by the gateway
        reason: String,
    },

    /// A key is absent from the store.
    #[error("key {key} not found")]
    NotFound {
        /// Missing key
        key: String,
    },

    /// A versioned configuration record is absent.
    #[error("configuration v{version} of service {service} not found")]
    VersionNotFound {
        /// Service name
        service: String,
        /// Requested version
        version: i64,
    },

    /// Stored bytes do not decode into the expected record shape.
    #[error("malformed record at {key}: {reason}")]
    MalformedRecord {
        /// Key holding the record
        key: String,
        /// Decoder message
        reason: String,
    },

    /// The descriptor exists but carries no version for the environment.
    #[error("service {service} has no configuration version published for environment {environment}")]
    NoPublishedVersion {
        /// Service name
        service: String,
        /// Environment tag the version was selected for
        environment: String,
    },

    /// The resolved version equals the one the caller already holds.
    #[error("service {service} in environment {environment} is still at v{version}")]
    VersionUnchanged {
        /// Service name
        service: String,
        /// Environment tag
        environment: String,
        /// Current (unchanged) version
        version: i64,
    },
}

impl ConfigError {
    /// Builds a `StoreUnavailable` error from any displayable cause.
    pub fn unavailable(key: impl Into<String>, reason: impl ToString) -> Self {
        ConfigError::StoreUnavailable {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Builds a `MalformedRecord` error from a decoder error.
    pub fn malformed(key: impl Into<String>, reason: impl ToString) -> Self {
        ConfigError::MalformedRecord {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the failure is transient (store side) rather than a data problem.
    pub fn is_transient(&self) -> bool {
        matches!(self, ConfigError::StoreUnavailable { .. })
    }
}

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error reading a store seed file.
    #[error("Seed file error: {0}")]
    SeedIoError(#[from] std::io::Error),

    /// Seed file is not a JSON object of keys to values.
    #[error("Seed file format error: {0}")]
    SeedFormatError(String),

    /// The store refused seed data.
    #[error("Seed store error: {0}")]
    SeedStoreError(#[from] ConfigError),
}
