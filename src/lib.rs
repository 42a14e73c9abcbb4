//! service_config library: versioned service configuration from a watchable
//! key-value store.
//!
//! A service's descriptor (`service.info.<name>`) names the configuration
//! version active in each deployment environment; the payload of each version
//! lives at `service.config.<name>.<version>`. This crate merges the active
//! payload into a local configuration object at startup and then watches the
//! descriptor, handing new content to a callback whenever the version changes.
//!
//! # Example
//!
//! ```no_run
//! use serde::{Deserialize, Serialize};
//! use service_config::{BoundedStore, ConfigCenter, MemoryStore};
//!
//! #[derive(Default, Serialize, Deserialize)]
//! #[serde(default)]
//! struct BillingConfig {
//!     limit: u32,
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let center = ConfigCenter::new(BoundedStore::new(MemoryStore::new()));
//!
//! let mut cfg = BillingConfig::default();
//! let version = center.initialize("billing", "pro", &mut cfg).await;
//!
//! let watch = center.spawn_watch("billing", "pro", version, |content| {
//!     log::info!("configuration changed: {}", content);
//! });
//! # watch.shutdown().await;
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime.

#![warn(missing_docs)]

pub mod bootstrap;
mod client;
pub mod config;
pub mod error_handling;
pub mod fetcher;
pub mod initialization;
pub mod models;
pub mod resolver;
pub mod store;
pub mod watch;

// Re-export public API
pub use bootstrap::initialize;
pub use client::ConfigCenter;
pub use error_handling::{ConfigError, InitializationError};
pub use models::{Environment, EnvironmentVersions, ServiceDescriptor, VersionedConfigRecord};
pub use store::{
    BoundedStore, KeyValue, MemoryStore, SortOrder, StoreGateway, WatchEvent, WatchEventKind,
    WatchStream,
};
pub use watch::{EventOutcome, WatchHandle, WatchLoop, WatchState};
