//! Local playlist store
//!
//! Holds the last known good playlist, persists it as a JSON file and
//! publishes every replacement as a whole [`PlaylistSnapshot`] on a watch
//! channel. Writers are serialized; readers only ever see complete snapshots.

use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::core::models::{PlaylistSnapshot, StorageError, VideoRecord};

/// Durable, observable holder of the current playlist
#[derive(Debug)]
pub struct VideoStore {
    path: Option<PathBuf>,
    write_lock: Mutex<()>,
    sender: watch::Sender<PlaylistSnapshot>,
}

impl VideoStore {
    /// Store without a backing file
    pub fn in_memory() -> Self {
        Self::with_snapshot(None, PlaylistSnapshot::empty())
    }

    /// Open the store backed by `path`, loading the last written playlist.
    ///
    /// A missing file yields an empty playlist. An unreadable or corrupt file
    /// is logged and treated as empty; the next successful write replaces it.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let videos = match load_records(&path).await {
            Ok(Some(videos)) => {
                info!("Loaded {} cached videos from {:?}", videos.len(), path);
                videos
            }
            Ok(None) => {
                debug!("No playlist cache at {:?}", path);
                Vec::new()
            }
            Err(err) => {
                warn!("Ignoring unreadable playlist cache {:?}: {}", path, err);
                Vec::new()
            }
        };

        Self::with_snapshot(Some(path), PlaylistSnapshot::new(0, videos))
    }

    fn with_snapshot(path: Option<PathBuf>, snapshot: PlaylistSnapshot) -> Self {
        let (sender, _) = watch::channel(snapshot);
        Self {
            path,
            write_lock: Mutex::new(()),
            sender,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The snapshot readers currently see
    pub fn current(&self) -> PlaylistSnapshot {
        self.sender.borrow().clone()
    }

    /// Live sequence of playlists, starting with the current one
    pub fn observe(&self) -> watch::Receiver<PlaylistSnapshot> {
        self.sender.subscribe()
    }

    /// Number of live observers
    pub fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Replace the entire playlist.
    ///
    /// The new snapshot is persisted first and published only once the file
    /// write has completed. On error nothing is published and the previous
    /// snapshot stays current.
    pub async fn replace_all(
        &self,
        videos: Vec<VideoRecord>,
    ) -> Result<PlaylistSnapshot, StorageError> {
        let _guard = self.write_lock.lock().await;

        if let Some(path) = &self.path {
            persist_records(path, &videos).await?;
        }

        let generation = self.sender.borrow().generation() + 1;
        let snapshot = PlaylistSnapshot::new(generation, videos);
        self.sender.send_replace(snapshot.clone());

        debug!(
            "Published playlist generation {} ({} videos)",
            generation,
            snapshot.len()
        );
        Ok(snapshot)
    }
}

async fn load_records(path: &Path) -> Result<Option<Vec<VideoRecord>>, StorageError> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Write to a sibling temp file and rename it over the cache
async fn persist_records(path: &Path, videos: &[VideoRecord]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let content = serde_json::to_vec_pretty(videos)?;
    let tmp_path = temp_path(path);
    fs::write(&tmp_path, &content).await?;
    if let Err(err) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(err.into());
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "videos.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn records(tag: &str, n: usize) -> Vec<VideoRecord> {
        (0..n)
            .map(|i| {
                VideoRecord::new(
                    format!("{tag}-{i}"),
                    String::new(),
                    format!("https://www.youtube.com/watch?v={tag}{i}"),
                    String::new(),
                    String::new(),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_open_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = VideoStore::open(dir.path().join("videos.json")).await;

        assert!(store.current().is_empty());
        assert_eq!(store.current().generation(), 0);
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache").join("videos.json");

        let store = VideoStore::open(&path).await;
        store.replace_all(records("a", 3)).await.unwrap();
        store.replace_all(records("a", 3)).await.unwrap();
        assert_eq!(store.current().generation(), 2);
        drop(store);

        let reopened = VideoStore::open(&path).await;
        assert_eq!(reopened.current().videos(), records("a", 3).as_slice());
        // generations are not persisted, the loaded snapshot starts over
        assert_eq!(reopened.current().generation(), 0);
        assert!(!temp_path(&path).exists());
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_treated_as_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("videos.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = VideoStore::open(&path).await;
        assert!(store.current().is_empty());

        store.replace_all(records("b", 1)).await.unwrap();
        assert_eq!(VideoStore::open(&path).await.current().len(), 1);
    }

    #[tokio::test]
    async fn test_replace_all_emits_once_per_write() {
        let store = VideoStore::in_memory();
        let mut rx = store.observe();
        assert!(!rx.has_changed().unwrap());

        let snapshot = store.replace_all(records("a", 2)).await.unwrap();
        assert_eq!(snapshot.generation(), 1);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 2);
        assert!(!rx.has_changed().unwrap());

        // identical content still counts as a new snapshot
        store.replace_all(records("a", 2)).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().generation(), 2);
    }

    #[tokio::test]
    async fn test_failed_write_publishes_nothing() {
        let dir = tempdir().unwrap();
        // a directory where the cache file should be makes the rename fail
        let path = dir.path().join("videos.json");
        std::fs::create_dir_all(path.join("occupied")).unwrap();

        let store = VideoStore::open(&path).await;
        let mut rx = store.observe();

        assert!(store.replace_all(records("a", 1)).await.is_err());
        assert!(!rx.has_changed().unwrap());
        assert!(store.current().is_empty());
    }

    #[tokio::test]
    async fn test_readers_never_see_mixed_generations() {
        let dir = tempdir().unwrap();
        let store = Arc::new(VideoStore::open(dir.path().join("videos.json")).await);
        let mut rx = store.observe();

        let writers: Vec<_> = (0..8)
            .map(|w| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    for round in 0..5 {
                        let tag = format!("w{w}r{round}");
                        store.replace_all(records(&tag, 4)).await.unwrap();
                    }
                })
            })
            .collect();

        let reader = tokio::spawn(async move {
            let mut seen = 0;
            while rx.changed().await.is_ok() {
                let snapshot = rx.borrow_and_update().clone();
                let tags: Vec<&str> = snapshot
                    .videos()
                    .iter()
                    .map(|v| v.title().split('-').next().unwrap_or_default())
                    .collect();
                assert_eq!(snapshot.len(), 4);
                assert!(tags.windows(2).all(|pair| pair[0] == pair[1]));
                seen += 1;
                if snapshot.generation() == 40 {
                    break;
                }
            }
            seen
        });

        for writer in writers {
            writer.await.unwrap();
        }
        assert!(reader.await.unwrap() >= 1);
        assert_eq!(store.current().generation(), 40);

        // last writer wins on disk too
        let reopened = VideoStore::open(dir.path().join("videos.json")).await;
        assert_eq!(reopened.current().videos(), store.current().videos());
    }
}
