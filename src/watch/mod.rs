//! Long-lived watch on a service descriptor.
//!
//! The loop subscribes to the descriptor key, re-resolves the environment's
//! version on every put, and hands the new configuration content to the
//! caller's action when, and only when, the version differs from the one last
//! applied. It never returns an error: malformed descriptors, missing records
//! and store outages are logged and the loop carries on. Closed streams are
//! re-established after a capped exponential backoff.
//!
//! State machine:
//!
//! ```text
//! Subscribing --stream opened--> Listening --stream closed--> Reconnecting
//!      ^  |                                                      |
//!      |  +-----------subscription failed------------------------+
//!      +---------------------------after backoff-----------------+
//!
//! any state --cancelled--> Stopped
//! ```
//!
//! Cancellation is observed while subscribing, while waiting for events and
//! during backoff. The current phase is published on a `tokio::sync::watch`
//! channel so a [`WatchHandle`] can report it while the loop runs.
//!
//! Descriptor versions only move forward. An event carrying a version below
//! the last applied one is stale (typically a write already covered by the
//! catch-up read after a re-subscription) and is skipped.

mod handle;

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::service_info_key;
use crate::error_handling::resubscribe_backoff;
use crate::fetcher::fetch;
use crate::resolver::{descriptor_version, resolve};
use crate::store::{StoreGateway, WatchEvent, WatchEventKind};

pub use handle::WatchHandle;

/// Phase of a running watch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Establishing a change stream on the descriptor key
    Subscribing,
    /// Consuming events from an open stream
    Listening,
    /// Stream closed or store unreachable; waiting out the backoff
    Reconnecting,
    /// Cancelled; `run` has returned or is about to
    Stopped,
}

/// What a single change event led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Not a put on the descriptor key
    Ignored,
    /// Descriptor value did not decode
    Malformed,
    /// Version equals the last applied one
    Duplicate(i64),
    /// Version is older than the last applied one
    Stale(i64),
    /// Version changed but its record could not be fetched
    FetchFailed(i64),
    /// Action invoked with the content of this version
    Applied(i64),
}

/// Watch session for one (service, environment) pair.
///
/// Run exactly one loop per pair; two loops would each invoke their action.
pub struct WatchLoop {
    store: Arc<dyn StoreGateway>,
    service_name: String,
    environment: String,
    descriptor_key: String,
    last_applied_version: i64,
    state: watch::Sender<WatchState>,
}

impl WatchLoop {
    /// Creates a session starting from `initial_version`, normally the value
    /// returned by bootstrap (0 when bootstrap applied nothing).
    pub fn new(
        store: Arc<dyn StoreGateway>,
        service_name: impl Into<String>,
        environment: impl Into<String>,
        initial_version: i64,
    ) -> Self {
        let service_name = service_name.into();
        WatchLoop {
            store,
            descriptor_key: service_info_key(&service_name),
            service_name,
            environment: environment.into(),
            last_applied_version: initial_version,
            state: watch::Sender::new(WatchState::Subscribing),
        }
    }

    /// Version last handed to the action (or the initial version).
    pub fn last_applied_version(&self) -> i64 {
        self.last_applied_version
    }

    /// Current phase.
    pub fn state(&self) -> WatchState {
        *self.state.borrow()
    }

    /// Receiver that follows the phase after `run` has taken the loop.
    pub fn state_changes(&self) -> watch::Receiver<WatchState> {
        self.state.subscribe()
    }

    fn set_state(&self, state: WatchState) {
        self.state.send_replace(state);
    }

    /// Processes one change event.
    pub async fn handle_event<F>(&mut self, event: &WatchEvent, action: &mut F) -> EventOutcome
    where
        F: FnMut(String) + Send,
    {
        if event.kind != WatchEventKind::Put || event.key != self.descriptor_key {
            return EventOutcome::Ignored;
        }

        let version = match descriptor_version(&event.key, &event.value, &self.environment) {
            Ok(version) => version,
            Err(e) => {
                log::error!(
                    "[{}/{}] ignoring descriptor update: {}",
                    self.service_name,
                    self.environment,
                    e
                );
                return EventOutcome::Malformed;
            }
        };

        if version == self.last_applied_version {
            log::debug!(
                "[{}/{}] descriptor update keeps v{}, nothing to apply",
                self.service_name,
                self.environment,
                version
            );
            return EventOutcome::Duplicate(version);
        }

        if version < self.last_applied_version {
            log::debug!(
                "[{}/{}] descriptor update to v{} is older than applied v{}, skipping",
                self.service_name,
                self.environment,
                version,
                self.last_applied_version
            );
            return EventOutcome::Stale(version);
        }

        self.apply_version(version, action).await
    }

    /// Runs until `cancel` fires, then returns the last applied version.
    pub async fn run<F>(mut self, mut action: F, cancel: CancellationToken) -> i64
    where
        F: FnMut(String) + Send,
    {
        let mut backoff = resubscribe_backoff();
        let mut resubscribing = false;

        'session: loop {
            self.set_state(WatchState::Subscribing);
            let subscribed = tokio::select! {
                biased;
                _ = cancel.cancelled() => break 'session,
                result = self.store.watch(&self.descriptor_key) => result,
            };

            match subscribed {
                Ok(mut stream) => {
                    self.set_state(WatchState::Listening);
                    backoff = resubscribe_backoff();
                    log::info!(
                        "[{}/{}] watching {} from v{}",
                        self.service_name,
                        self.environment,
                        self.descriptor_key,
                        self.last_applied_version
                    );

                    if resubscribing {
                        self.catch_up(&mut action).await;
                    }
                    resubscribing = true;

                    loop {
                        let event = tokio::select! {
                            biased;
                            _ = cancel.cancelled() => break 'session,
                            event = stream.recv() => event,
                        };
                        match event {
                            Some(event) => {
                                self.handle_event(&event, &mut action).await;
                            }
                            None => break,
                        }
                    }

                    log::warn!(
                        "[{}/{}] watch stream on {} closed, re-subscribing",
                        self.service_name,
                        self.environment,
                        self.descriptor_key
                    );
                }
                Err(e) => {
                    log::warn!(
                        "[{}/{}] cannot watch {}: {}",
                        self.service_name,
                        self.environment,
                        self.descriptor_key,
                        e
                    );
                }
            }

            self.set_state(WatchState::Reconnecting);
            let delay = backoff
                .next()
                .unwrap_or(std::time::Duration::from_secs(crate::config::RESUBSCRIBE_MAX_DELAY_SECS));
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break 'session,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.set_state(WatchState::Stopped);
        log::info!(
            "[{}/{}] watch stopped at v{}",
            self.service_name,
            self.environment,
            self.last_applied_version
        );
        self.last_applied_version
    }

    /// Applies whatever version is current after a gap in the event stream.
    async fn catch_up<F>(&mut self, action: &mut F)
    where
        F: FnMut(String) + Send,
    {
        match resolve(self.store.as_ref(), &self.service_name, &self.environment).await {
            Ok(version) if version > self.last_applied_version => {
                log::info!(
                    "[{}/{}] descriptor moved to v{} while the watch was down",
                    self.service_name,
                    self.environment,
                    version
                );
                self.apply_version(version, action).await;
            }
            Ok(_) => {}
            Err(e) => {
                log::warn!(
                    "[{}/{}] cannot re-check version after re-subscribing: {}",
                    self.service_name,
                    self.environment,
                    e
                );
            }
        }
    }

    async fn apply_version<F>(&mut self, version: i64, action: &mut F) -> EventOutcome
    where
        F: FnMut(String) + Send,
    {
        match fetch(self.store.as_ref(), &self.service_name, version).await {
            Ok(content) => {
                action(content);
                self.last_applied_version = version;
                log::info!(
                    "[{}/{}] configuration switched to v{}",
                    self.service_name,
                    self.environment,
                    version
                );
                EventOutcome::Applied(version)
            }
            Err(e) => {
                log::error!(
                    "[{}/{}] cannot load configuration v{}: {}",
                    self.service_name,
                    self.environment,
                    version,
                    e
                );
                EventOutcome::FetchFailed(version)
            }
        }
    }
}
