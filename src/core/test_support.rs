//! Test doubles shared by the core unit and integration tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::core::fetcher::VideoSource;
use crate::core::launcher::LaunchTarget;
use crate::core::models::{AppError, AppResult, NetworkVideo, TransportError};
use crate::core::presenter::ErrorNotifier;

pub fn network_video(i: usize) -> NetworkVideo {
    NetworkVideo {
        title: format!("title-{i}"),
        description: format!("description-{i}"),
        url: format!("https://www.youtube.com/watch?v=id{i}"),
        updated: "2018-06-07T17:09:43+00:00".to_string(),
        thumbnail: format!("https://i.ytimg.com/vi/id{i}/hqdefault.jpg"),
        closed_captions: None,
    }
}

/// In-memory [`VideoSource`] that can be switched to failing
#[derive(Debug, Default)]
pub struct StaticSource {
    videos: Mutex<Vec<NetworkVideo>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl StaticSource {
    pub fn ok(videos: Vec<NetworkVideo>) -> Self {
        Self {
            videos: Mutex::new(videos),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        let source = Self::default();
        source.set_failing(true);
        source
    }

    pub fn set_videos(&self, videos: Vec<NetworkVideo>) {
        *self.videos.lock() = videos;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_all(&self) -> Result<Vec<NetworkVideo>, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Status(503));
        }
        Ok(self.videos.lock().clone())
    }
}

/// [`LaunchTarget`] that knows a fixed set of schemes and records opens.
///
/// Like a real handler lookup, a deep link with an empty payload is never
/// openable.
#[derive(Debug, Default)]
pub struct RecordingTarget {
    schemes: HashSet<String>,
    opened: Mutex<Vec<String>>,
    fail_open: bool,
}

impl RecordingTarget {
    pub fn with_schemes(schemes: &[&str]) -> Self {
        Self {
            schemes: schemes.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().clone()
    }
}

impl LaunchTarget for RecordingTarget {
    fn can_open(&self, uri: &str) -> bool {
        match uri.split_once(':') {
            Some((scheme, payload)) => !payload.is_empty() && self.schemes.contains(scheme),
            None => false,
        }
    }

    fn open(&self, uri: &str) -> AppResult<()> {
        self.opened.lock().push(uri.to_string());
        if self.fail_open {
            return Err(AppError::Launch(format!("no viewer for {uri}")));
        }
        Ok(())
    }
}

/// Counts error notifications
#[derive(Debug, Clone, Default)]
pub struct CountingNotifier {
    count: Arc<AtomicUsize>,
}

impl CountingNotifier {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl ErrorNotifier for CountingNotifier {
    fn notify_network_error(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}
