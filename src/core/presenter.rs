//! List presenter
//!
//! Owns the rows of one screen. Every published playlist replaces the rows
//! wholesale (full redraw); a pending sync error is announced once and then
//! acknowledged. Dropping the presenter releases both subscriptions.

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::core::launcher::{LaunchDecision, LaunchResolver, LaunchTarget};
use crate::core::models::{PlaylistSnapshot, VideoRecord};
use crate::core::status::{SyncStatus, SyncStatusHandle};
use crate::core::store::VideoStore;

/// Message shown for a failed sync
pub const NETWORK_ERROR_MESSAGE: &str = "Network Error";

/// Tells the user a sync failed
pub trait ErrorNotifier {
    fn notify_network_error(&self);
}

/// Reports sync errors through the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl ErrorNotifier for LogNotifier {
    fn notify_network_error(&self) {
        warn!("{}", NETWORK_ERROR_MESSAGE);
    }
}

/// Wraps a closure as an [`ErrorNotifier`]
pub struct FnNotifier<F>(pub F);

impl<F: Fn()> ErrorNotifier for FnNotifier<F> {
    fn notify_network_error(&self) {
        (self.0)()
    }
}

impl<F> std::fmt::Debug for FnNotifier<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnNotifier")
    }
}

/// What a presenter update changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterUpdate {
    PlaylistReplaced { generation: u64, count: usize },
    StatusChanged(SyncStatus),
}

/// Rows of one screen plus its click dispatch
#[derive(Debug)]
pub struct ListPresenter<N, T> {
    snapshot: PlaylistSnapshot,
    playlist: watch::Receiver<PlaylistSnapshot>,
    playlist_open: bool,
    status: SyncStatusHandle,
    status_rx: watch::Receiver<SyncStatus>,
    status_open: bool,
    notifier: N,
    resolver: LaunchResolver<T>,
}

impl<N: ErrorNotifier, T: LaunchTarget> ListPresenter<N, T> {
    /// Subscribe to `store` and `status` and render what is current
    pub fn new(
        store: &VideoStore,
        status: SyncStatusHandle,
        notifier: N,
        resolver: LaunchResolver<T>,
    ) -> Self {
        let mut playlist = store.observe();
        let snapshot = playlist.borrow_and_update().clone();
        let status_rx = status.subscribe();

        let mut presenter = Self {
            snapshot,
            playlist,
            playlist_open: true,
            status,
            status_rx,
            status_open: true,
            notifier,
            resolver,
        };
        presenter.apply_status();
        presenter
    }

    pub fn rows(&self) -> &[VideoRecord] {
        self.snapshot.videos()
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    /// Generation of the displayed snapshot
    pub fn generation(&self) -> u64 {
        self.snapshot.generation()
    }

    pub fn resolver(&self) -> &LaunchResolver<T> {
        &self.resolver
    }

    /// One numbered text line per row
    pub fn render_lines(&self) -> Vec<String> {
        self.rows()
            .iter()
            .enumerate()
            .map(|(i, video)| {
                let description = video.short_description();
                if description.is_empty() {
                    format!("{:>3}. {} [{}]", i + 1, video.title(), video.updated())
                } else {
                    format!(
                        "{:>3}. {} [{}]\n     {}",
                        i + 1,
                        video.title(),
                        video.updated(),
                        description
                    )
                }
            })
            .collect()
    }

    /// Apply whatever has already been published, without waiting
    pub fn apply_pending(&mut self) -> Vec<PresenterUpdate> {
        let mut updates = Vec::new();
        if self.playlist.has_changed().unwrap_or(false) {
            updates.push(self.apply_playlist());
        }
        if self.status_rx.has_changed().unwrap_or(false) {
            updates.push(self.apply_status());
        }
        updates
    }

    /// Wait for the next playlist or status change and apply it.
    ///
    /// Returns `None` once both sources are gone.
    pub async fn next_update(&mut self) -> Option<PresenterUpdate> {
        loop {
            if !self.playlist_open && !self.status_open {
                return None;
            }

            tokio::select! {
                changed = self.playlist.changed(), if self.playlist_open => {
                    match changed {
                        Ok(()) => return Some(self.apply_playlist()),
                        Err(_) => self.playlist_open = false,
                    }
                }
                changed = self.status_rx.changed(), if self.status_open => {
                    match changed {
                        Ok(()) => return Some(self.apply_status()),
                        Err(_) => self.status_open = false,
                    }
                }
            }
        }
    }

    /// Forward the record at `position` of the displayed rows to the resolver
    pub fn click(&self, position: usize) -> Option<LaunchDecision> {
        let Some(video) = self.rows().get(position) else {
            debug!("Click on missing row {}", position);
            return None;
        };
        Some(self.resolver.launch(video))
    }

    fn apply_playlist(&mut self) -> PresenterUpdate {
        self.snapshot = self.playlist.borrow_and_update().clone();
        debug!(
            "Rendering playlist generation {} ({} rows)",
            self.snapshot.generation(),
            self.snapshot.len()
        );
        PresenterUpdate::PlaylistReplaced {
            generation: self.snapshot.generation(),
            count: self.snapshot.len(),
        }
    }

    fn apply_status(&mut self) -> PresenterUpdate {
        let mut status = *self.status_rx.borrow_and_update();
        while status.needs_notification() {
            self.notifier.notify_network_error();
            if !self.status.mark_error_shown(&status) {
                debug!("Error epoch {} superseded before acknowledgment", status.error_epoch);
            }
            // picks up our own acknowledgment or an error raised meanwhile
            status = *self.status_rx.borrow_and_update();
        }
        PresenterUpdate::StatusChanged(status)
    }
}
