//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::constants::{DEFAULT_ENVIRONMENT, STORE_OP_TIMEOUT};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Command-line options of the `service-config` binary.
///
/// # Examples
///
/// ```bash
/// # Print the merged configuration of `billing` in production
/// service-config --service billing --seed ./store.json
///
/// # Keep watching the test environment and print every new version
/// service-config --service billing --env test --seed ./store.json --watch
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "service-config",
    about = "Resolves, merges and watches versioned service configuration."
)]
pub struct Opt {
    /// Service name (descriptor key is `service.info.<name>`)
    #[arg(long, env = "SERVICE_CONFIG_NAME")]
    pub service: String,

    /// Deployment environment: dev|test|pre|pro (anything else reads `pro`)
    #[arg(long = "env", env = "SERVICE_CONFIG_ENV", default_value = DEFAULT_ENVIRONMENT)]
    pub environment: String,

    /// JSON file of `key -> value` pairs loaded into the in-process store
    #[arg(long, value_parser)]
    pub seed: PathBuf,

    /// Per-call store timeout in seconds
    #[arg(long, default_value_t = STORE_OP_TIMEOUT.as_secs())]
    pub timeout_seconds: u64,

    /// Keep watching for new versions until interrupted
    #[arg(long)]
    pub watch: bool,

    /// While watching, re-read the seed file this often and publish its changes
    /// (0 disables reloading)
    #[arg(long, default_value_t = 2)]
    pub reload_seconds: u64,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}
