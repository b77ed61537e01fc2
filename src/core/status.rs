//! Process-wide sync status flag

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Whether the latest sync failed and whether the user has been told
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub has_error: bool,
    pub error_shown: bool,
    /// Bumped on every new error; an acknowledgment applies to one epoch only
    pub error_epoch: u64,
}

impl SyncStatus {
    /// An error the user has not been notified about yet
    pub fn needs_notification(&self) -> bool {
        self.has_error && !self.error_shown
    }
}

/// Shared, observable [`SyncStatus`]
#[derive(Debug, Clone)]
pub struct SyncStatusHandle {
    sender: Arc<watch::Sender<SyncStatus>>,
}

impl SyncStatusHandle {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(SyncStatus::default());
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn current(&self) -> SyncStatus {
        *self.sender.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.sender.subscribe()
    }

    /// Flag a failed sync. Returns true when this is a new error.
    ///
    /// Only a false to true transition of `has_error` counts as new and
    /// clears the acknowledgment; repeated failures leave the state alone.
    pub fn record_failure(&self) -> bool {
        let is_new = self.sender.send_if_modified(|status| {
            if status.has_error {
                return false;
            }
            status.has_error = true;
            status.error_shown = false;
            status.error_epoch += 1;
            true
        });
        if is_new {
            debug!("Sync status: new error");
        }
        is_new
    }

    /// Clear both flags after a successful sync
    pub fn record_success(&self) {
        self.sender.send_if_modified(|status| {
            if !status.has_error && !status.error_shown {
                return false;
            }
            status.has_error = false;
            status.error_shown = false;
            true
        });
    }

    /// Acknowledge the error observed in `shown`.
    ///
    /// Returns false and changes nothing when a newer error replaced it in the
    /// meantime, so that error still gets announced.
    pub fn mark_error_shown(&self, shown: &SyncStatus) -> bool {
        self.sender.send_if_modified(|status| {
            if !status.needs_notification() || status.error_epoch != shown.error_epoch {
                return false;
            }
            status.error_shown = true;
            true
        })
    }
}

impl Default for SyncStatusHandle {
    fn default() -> Self {
        Self::new()
    }
}
