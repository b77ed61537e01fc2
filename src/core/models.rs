//! Core data models for the DevByte viewer

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Maximum characters kept by [`VideoRecord::short_description`]
pub const SHORT_DESCRIPTION_LEN: usize = 80;

/// One playable DevByte as shown in the list.
///
/// Records are only built by mapping a [`NetworkVideo`] (or by reloading a
/// previously persisted snapshot of mapped records) and never change after
/// that. A newer sync replaces the whole collection instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    title: String,

    description: String,

    url: String,

    updated: String,

    thumbnail: String,
}

impl VideoRecord {
    pub(crate) fn new(
        title: String,
        description: String,
        url: String,
        updated: String,
        thumbnail: String,
    ) -> Self {
        Self {
            title,
            description,
            url,
            updated,
            thumbnail,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Playback location
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Opaque timestamp token from the server, never parsed
    pub fn updated(&self) -> &str {
        &self.updated
    }

    pub fn thumbnail(&self) -> &str {
        &self.thumbnail
    }

    /// Description cut down to a single list line
    pub fn short_description(&self) -> String {
        let first_line = self.description.lines().next().unwrap_or_default();
        if first_line.chars().count() <= SHORT_DESCRIPTION_LEN {
            return first_line.to_string();
        }
        let mut short: String = first_line.chars().take(SHORT_DESCRIPTION_LEN).collect();
        short.push('…');
        short
    }
}

/// Wire shape of a single entry in the remote playlist

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkVideo {
    pub title: String,

    pub description: String,

    pub url: String,

    pub updated: String,

    pub thumbnail: String,

    #[serde(rename = "closedCaptions", default)]
    pub closed_captions: Option<String>,
}

/// Top-level remote response body: `{"videos": [...]}`

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkVideoContainer {
    pub videos: Vec<NetworkVideo>,
}

/// Immutable view of the stored playlist at one sync generation.
///
/// Cloning is cheap; every clone shares the same records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistSnapshot {
    generation: u64,
    videos: Arc<[VideoRecord]>,
}

impl PlaylistSnapshot {
    pub fn new(generation: u64, videos: Vec<VideoRecord>) -> Self {
        Self {
            generation,
            videos: videos.into(),
        }
    }

    /// Empty playlist before any successful sync
    pub fn empty() -> Self {
        Self::new(0, Vec::new())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn videos(&self) -> &[VideoRecord] {
        &self.videos
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }
}

impl Default for PlaylistSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Failure while talking to the remote playlist endpoint
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    #[error("Malformed response body: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Failure while persisting the playlist snapshot
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Cache IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Application error types

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] TransportError),

    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Launch error: {0}")]
    Launch(String),

    #[error("System error: {0}")]
    System(String),
}

/// Result type alias for application operations

pub type AppResult<T> = Result<T, AppError>;
