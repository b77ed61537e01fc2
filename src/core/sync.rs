//! Sync coordinator: fetch remote, map, replace local store

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use crate::core::fetcher::VideoSource;
use crate::core::mapping::as_domain_model;
use crate::core::models::{StorageError, TransportError};
use crate::core::status::SyncStatusHandle;
use crate::core::store::VideoStore;

/// Why a refresh did not update the store
#[derive(Debug, thiserror::Error)]
pub enum SyncFailure {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result of one refresh. Failures are values, never raised.
#[derive(Debug)]
pub enum SyncOutcome {
    Updated { generation: u64, count: usize },
    Failed(SyncFailure),
}

impl SyncOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated { .. })
    }
}

/// Orchestrates refreshes against one source and one store
#[derive(Clone)]
pub struct SyncCoordinator {
    source: Arc<dyn VideoSource>,
    store: Arc<VideoStore>,
    status: SyncStatusHandle,
    last_synced_at: Arc<RwLock<Option<DateTime<Utc>>>>,
}

impl SyncCoordinator {
    pub fn new(
        source: Arc<dyn VideoSource>,
        store: Arc<VideoStore>,
        status: SyncStatusHandle,
    ) -> Self {
        Self {
            source,
            store,
            status,
            last_synced_at: Arc::new(RwLock::new(None)),
        }
    }

    /// Time of the last refresh that updated the store
    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        *self.last_synced_at.read()
    }

    /// Fetch the remote playlist once and replace the store contents.
    ///
    /// On failure the store is left untouched and the sync status is
    /// flagged. Safe to call concurrently; the last completed write wins.
    #[instrument(skip(self), fields(source = self.source.name()))]
    pub async fn refresh_videos(&self) -> SyncOutcome {
        let entries = match self.source.fetch_all().await {
            Ok(entries) => entries,
            Err(err) => return self.fail(err.into()),
        };

        let videos = as_domain_model(entries);
        match self.store.replace_all(videos).await {
            Ok(snapshot) => {
                *self.last_synced_at.write() = Some(Utc::now());
                self.status.record_success();
                info!(
                    "Playlist refreshed: {} videos, generation {}",
                    snapshot.len(),
                    snapshot.generation()
                );
                SyncOutcome::Updated {
                    generation: snapshot.generation(),
                    count: snapshot.len(),
                }
            }
            Err(err) => self.fail(err.into()),
        }
    }

    /// Run [`refresh_videos`](Self::refresh_videos) on the tokio runtime.
    ///
    /// Dropping or aborting the handle abandons the result; a store write
    /// that already started still completes.
    pub fn spawn_refresh(&self) -> JoinHandle<SyncOutcome> {
        let coordinator = self.clone();
        tokio::spawn(async move { coordinator.refresh_videos().await })
    }

    fn fail(&self, failure: SyncFailure) -> SyncOutcome {
        let is_new = self.status.record_failure();
        warn!("Playlist refresh failed (new error: {}): {}", is_new, failure);
        SyncOutcome::Failed(failure)
    }
}

impl std::fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("source", &self.source.name())
            .field("store", &self.store.path())
            .field("status", &self.status.current())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{network_video, StaticSource};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_refresh_replaces_store_and_clears_status() {
        let source = Arc::new(StaticSource::ok(vec![network_video(1), network_video(2)]));
        let store = Arc::new(VideoStore::in_memory());
        let status = SyncStatusHandle::new();
        status.record_failure();

        let coordinator = SyncCoordinator::new(source.clone(), store.clone(), status.clone());
        let outcome = coordinator.refresh_videos().await;

        assert!(matches!(
            outcome,
            SyncOutcome::Updated {
                generation: 1,
                count: 2
            }
        ));
        assert_eq!(store.current().videos()[1].title(), "title-2");
        assert!(!status.current().has_error);
        assert!(coordinator.last_synced_at().is_some());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_store_untouched() {
        let source = Arc::new(StaticSource::ok(vec![network_video(1)]));
        let store = Arc::new(VideoStore::in_memory());
        let status = SyncStatusHandle::new();
        let coordinator = SyncCoordinator::new(source.clone(), store.clone(), status.clone());

        assert!(coordinator.refresh_videos().await.is_updated());
        let before = store.current();
        let mut rx = store.observe();

        source.set_failing(true);
        let outcome = coordinator.refresh_videos().await;

        assert!(matches!(
            outcome,
            SyncOutcome::Failed(SyncFailure::Transport(_))
        ));
        assert_eq!(store.current(), before);
        assert!(!rx.has_changed().unwrap());
        assert!(status.current().has_error);
    }

    #[tokio::test]
    async fn test_refresh_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("videos.json");
        let source = Arc::new(StaticSource::ok((0..5).map(network_video).collect()));
        let store = Arc::new(VideoStore::open(&path).await);
        let coordinator =
            SyncCoordinator::new(source.clone(), store.clone(), SyncStatusHandle::new());

        coordinator.refresh_videos().await;
        let first_bytes = std::fs::read(&path).unwrap();
        let first = store.current();

        coordinator.refresh_videos().await;
        let second_bytes = std::fs::read(&path).unwrap();
        let second = store.current();

        assert_eq!(first_bytes, second_bytes);
        assert_eq!(first.videos(), second.videos());
        assert_eq!(second.len(), 5);

        // a changed remote replaces everything, nothing is appended
        source.set_videos(vec![network_video(9)]);
        coordinator.refresh_videos().await;
        assert_eq!(store.current().len(), 1);
        assert_eq!(store.current().videos()[0].title(), "title-9");
    }

    #[tokio::test]
    async fn test_storage_failure_is_reported_as_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("videos.json");
        std::fs::create_dir_all(path.join("occupied")).unwrap();

        let store = Arc::new(VideoStore::open(&path).await);
        let status = SyncStatusHandle::new();
        let coordinator = SyncCoordinator::new(
            Arc::new(StaticSource::ok(vec![network_video(1)])),
            store.clone(),
            status.clone(),
        );

        let outcome = coordinator.refresh_videos().await;
        assert!(matches!(outcome, SyncOutcome::Failed(SyncFailure::Storage(_))));
        assert!(store.current().is_empty());
        assert!(status.current().has_error);
        assert!(coordinator.last_synced_at().is_none());
    }

    #[tokio::test]
    async fn test_spawned_refresh_completes_after_handle_dropped() {
        let store = Arc::new(VideoStore::in_memory());
        let coordinator = SyncCoordinator::new(
            Arc::new(StaticSource::ok(vec![network_video(7)])),
            store.clone(),
            SyncStatusHandle::new(),
        );
        let mut rx = store.observe();

        drop(coordinator.spawn_refresh());

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().videos()[0].title(), "title-7");
    }
}
