//! Background task handle for a running watch loop.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{WatchLoop, WatchState};

/// Owns a watch loop running on its own tokio task.
///
/// Dropping the handle does not stop the loop; call `shutdown` (or cancel the
/// token) to release the store subscription.
pub struct WatchHandle {
    cancel: CancellationToken,
    state: watch::Receiver<WatchState>,
    task: JoinHandle<i64>,
}

impl WatchHandle {
    /// Spawns `watch_loop` with `action` on the current tokio runtime.
    pub fn spawn<F>(watch_loop: WatchLoop, action: F) -> Self
    where
        F: FnMut(String) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let state = watch_loop.state_changes();
        let task = tokio::spawn(watch_loop.run(action, cancel.child_token()));
        WatchHandle {
            cancel,
            state,
            task,
        }
    }

    /// Phase the loop is in right now.
    pub fn state(&self) -> WatchState {
        *self.state.borrow()
    }

    /// Receiver notified on every phase change.
    pub fn state_changes(&self) -> watch::Receiver<WatchState> {
        self.state.clone()
    }

    /// Token that stops the loop when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the loop and waits for it to exit.
    ///
    /// Returns the last applied version, or `None` if the task panicked
    /// (e.g. inside the caller's action).
    pub async fn shutdown(self) -> Option<i64> {
        self.cancel.cancel();
        match self.task.await {
            Ok(version) => Some(version),
            Err(join_error) => {
                log::warn!("Watch task ended abnormally: {:?}", join_error);
                None
            }
        }
    }
}
