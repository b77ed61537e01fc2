//! DevByte Viewer - Core Library
//!
//! Fetches the DevBytes playlist, caches it locally, presents it as a list of
//! rows and resolves a click into the player app or the web page.

pub mod core;
pub mod utils;

// Re-export commonly used types
pub use crate::core::{
    config::AppConfig,
    fetcher::{FetcherConfig, HttpVideoSource, VideoSource},
    launcher::{LaunchDecision, LaunchResolver, LaunchTarget, SystemLaunchTarget},
    mapping::as_domain_model,
    models::{
        AppError, AppResult, NetworkVideo, NetworkVideoContainer, PlaylistSnapshot, VideoRecord,
    },
    presenter::{ErrorNotifier, FnNotifier, ListPresenter, LogNotifier, PresenterUpdate},
    runtime::{spawn_sync_runtime, SyncRuntimeHandle},
    status::{SyncStatus, SyncStatusHandle},
    store::VideoStore,
    sync::{SyncCoordinator, SyncFailure, SyncOutcome},
};

use anyhow::Context;
use std::sync::Arc;

/// Everything one viewer process shares between screens
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub store: Arc<VideoStore>,
    pub status: SyncStatusHandle,
    pub coordinator: SyncCoordinator,
}

impl AppContext {
    /// Wire source, store and status for one process
    pub async fn with_config(config: AppConfig) -> anyhow::Result<Self> {
        let source = HttpVideoSource::new(config.fetcher_config()?)
            .context("Failed to create playlist fetcher")?;

        let store = match config.cache_path()? {
            Some(path) => VideoStore::open(path).await,
            None => VideoStore::in_memory(),
        };
        let store = Arc::new(store);
        let status = SyncStatusHandle::new();
        let coordinator = SyncCoordinator::new(Arc::new(source), store.clone(), status.clone());

        Ok(Self {
            config,
            store,
            status,
            coordinator,
        })
    }

    /// Use a loaded configuration when it is valid, defaults otherwise.
    ///
    /// Logs why the loaded one was rejected, so install tracing first.
    pub fn config_or_default(loaded: anyhow::Result<AppConfig>) -> AppConfig {
        match loaded {
            Ok(cfg) => {
                if let Err(err) = cfg.validate() {
                    tracing::warn!(
                        "Invalid configuration detected ({}), falling back to defaults",
                        err
                    );
                    AppConfig::default()
                } else {
                    cfg
                }
            }
            Err(err) => {
                tracing::warn!(
                    "Failed to load configuration from disk: {}. Using defaults",
                    err
                );
                AppConfig::default()
            }
        }
    }

    /// Start the background refresh schedule
    pub fn start_runtime(&self) -> SyncRuntimeHandle {
        spawn_sync_runtime(self.coordinator.clone(), self.config.refresh_interval())
    }

    /// A presenter for one screen, launching through the desktop
    pub fn presenter<N: ErrorNotifier>(
        &self,
        notifier: N,
    ) -> ListPresenter<N, SystemLaunchTarget> {
        ListPresenter::new(
            &self.store,
            self.status.clone(),
            notifier,
            LaunchResolver::new(SystemLaunchTarget::new(), self.config.launch.player_scheme.clone()),
        )
    }
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging with default settings
pub fn init() -> anyhow::Result<()> {
    utils::logging::init_tracing("info");
    tracing::info!("📚 {} v{} initialized", NAME, VERSION);
    Ok(())
}
