//! Refresh runtime command router.
//!
//! A thin async command queue that serializes on-demand refresh requests with
//! the recurring refresh schedule, off the interactive thread.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info, instrument};

use crate::core::models::{AppError, AppResult};
use crate::core::sync::{SyncCoordinator, SyncOutcome};

/// Commands understood by the runtime router.
#[derive(Debug)]
pub enum RuntimeCommand {
    RefreshNow {
        respond_to: oneshot::Sender<SyncOutcome>,
    },
    Shutdown {
        respond_to: oneshot::Sender<()>,
    },
}

/// Handle exposed to the screen and the rest of the app.
#[derive(Debug, Clone)]
pub struct SyncRuntimeHandle {
    sender: mpsc::Sender<RuntimeCommand>,
}

impl SyncRuntimeHandle {
    pub fn new(sender: mpsc::Sender<RuntimeCommand>) -> Self {
        Self { sender }
    }

    async fn send_command<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> RuntimeCommand,
    ) -> AppResult<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|e| AppError::System(format!("Sync runtime unavailable: {}", e)))?;
        rx.await
            .map_err(|_| AppError::System("Sync runtime dropped response".into()))
    }

    /// Queue a refresh and wait for its outcome
    pub async fn refresh_now(&self) -> AppResult<SyncOutcome> {
        self.send_command(|tx| RuntimeCommand::RefreshNow { respond_to: tx })
            .await
    }

    /// Stop the router loop and its schedule
    pub async fn shutdown(&self) -> AppResult<()> {
        self.send_command(|tx| RuntimeCommand::Shutdown { respond_to: tx })
            .await
    }
}

/// Spawn the router loop, refreshing every `period` when one is given.
///
/// The first scheduled refresh happens one full period after startup; ask for
/// a startup refresh explicitly with [`SyncRuntimeHandle::refresh_now`].
pub fn spawn_sync_runtime(
    coordinator: SyncCoordinator,
    period: Option<Duration>,
) -> SyncRuntimeHandle {
    let (tx, rx) = mpsc::channel(64);
    let router_future = router_loop(coordinator, rx, period);

    match Handle::try_current() {
        Ok(handle) => {
            info!("[RUNTIME] Spawning sync router in existing tokio runtime");
            handle.spawn(router_future);
        }
        Err(_) => {
            tracing::warn!("[RUNTIME] No tokio runtime found, creating dedicated thread");
            let spawned = std::thread::Builder::new()
                .name("sync-runtime".into())
                .spawn(move || {
                    match tokio::runtime::Builder::new_current_thread()
                        .enable_all()
                        .build()
                    {
                        Ok(runtime) => runtime.block_on(router_future),
                        Err(e) => tracing::error!("[RUNTIME] Failed to build runtime: {}", e),
                    }
                });
            if let Err(e) = spawned {
                tracing::error!("[RUNTIME] Failed to spawn sync runtime thread: {}", e);
            }
        }
    }

    SyncRuntimeHandle::new(tx)
}

async fn router_loop(
    coordinator: SyncCoordinator,
    mut rx: mpsc::Receiver<RuntimeCommand>,
    period: Option<Duration>,
) {
    let mut ticker = period.map(|period| {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    });
    if let Some(ticker) = ticker.as_mut() {
        // interval fires immediately; skip that one
        ticker.tick().await;
    }

    loop {
        tokio::select! {
            command = rx.recv() => {
                let Some(command) = command else { break };
                if !handle_command(&coordinator, command).await {
                    break;
                }
            }
            _ = next_tick(&mut ticker) => {
                debug!("[RUNTIME] Scheduled refresh");
                coordinator.refresh_videos().await;
            }
        }
    }
    debug!("Sync runtime channel closed, exiting router loop");
}

/// Never resolves when no schedule is configured
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Returns false when the loop should stop
#[instrument(skip(coordinator, command), fields(?command))]
async fn handle_command(coordinator: &SyncCoordinator, command: RuntimeCommand) -> bool {
    match command {
        RuntimeCommand::RefreshNow { respond_to } => {
            let outcome = coordinator.refresh_videos().await;
            debug!("[RUNTIME_CMD] Refresh completed, updated: {}", outcome.is_updated());
            let _ = respond_to.send(outcome);
            true
        }
        RuntimeCommand::Shutdown { respond_to } => {
            info!("[RUNTIME_CMD] Shutting down sync runtime");
            let _ = respond_to.send(());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::status::SyncStatusHandle;
    use crate::core::store::VideoStore;
    use crate::core::test_support::{network_video, StaticSource};
    use std::sync::Arc;

    fn coordinator(source: Arc<StaticSource>) -> (SyncCoordinator, Arc<VideoStore>) {
        let store = Arc::new(VideoStore::in_memory());
        (
            SyncCoordinator::new(source, store.clone(), SyncStatusHandle::new()),
            store,
        )
    }

    #[tokio::test]
    async fn test_refresh_now_runs_refresh() {
        let source = Arc::new(StaticSource::ok(vec![network_video(1)]));
        let (coordinator, store) = coordinator(source.clone());
        let handle = spawn_sync_runtime(coordinator, None);

        let outcome = tokio_test::assert_ok!(handle.refresh_now().await);
        assert!(outcome.is_updated());
        assert_eq!(store.current().len(), 1);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_closes_handle() {
        let (coordinator, _) = coordinator(Arc::new(StaticSource::ok(Vec::new())));
        let handle = spawn_sync_runtime(coordinator, None);

        handle.shutdown().await.unwrap();
        assert!(handle.refresh_now().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_refreshes_periodically() {
        let source = Arc::new(StaticSource::ok(vec![network_video(1)]));
        let (coordinator, store) = coordinator(source.clone());
        let mut rx = store.observe();
        let _handle = spawn_sync_runtime(coordinator, Some(Duration::from_secs(60)));

        rx.changed().await.unwrap();
        assert_eq!(source.calls(), 1);
        rx.changed().await.unwrap();
        assert_eq!(source.calls(), 2);
        assert_eq!(rx.borrow().generation(), 2);
    }
}
