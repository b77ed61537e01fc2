//! Launch resolver: player app deep link or web fallback

use std::process::{Command, Stdio};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use crate::core::models::{AppError, AppResult, VideoRecord};

/// Default deep-link scheme of the YouTube app
pub const DEFAULT_PLAYER_SCHEME: &str = "vnd.youtube";

/// Query parameter that carries the video id
const VIDEO_ID_PARAM: &str = "v";

/// Host capabilities needed to launch a video
pub trait LaunchTarget {
    /// Whether something on the host can open `uri`
    fn can_open(&self, uri: &str) -> bool;

    /// Hand `uri` to its default handler without waiting for it to exit
    fn open(&self, uri: &str) -> AppResult<()>;
}

impl<T: LaunchTarget + ?Sized> LaunchTarget for Arc<T> {
    fn can_open(&self, uri: &str) -> bool {
        (**self).can_open(uri)
    }

    fn open(&self, uri: &str) -> AppResult<()> {
        (**self).open(uri)
    }
}

/// Where a click ends up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchDecision {
    /// Deep link into the player app
    App(String),
    /// The playback URL in the default viewer
    Web(String),
}

impl LaunchDecision {
    pub fn uri(&self) -> &str {
        match self {
            Self::App(uri) | Self::Web(uri) => uri,
        }
    }
}

/// Playback URL that does not carry a usable video id
#[derive(Debug, thiserror::Error)]
enum MalformedUri {
    #[error("unparsable url: {0}")]
    Parse(#[from] url::ParseError),

    #[error("missing `v` query parameter")]
    MissingVideoId,
}

fn extract_video_id(url: &str) -> Result<String, MalformedUri> {
    let parsed = Url::parse(url)?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == VIDEO_ID_PARAM)
        .map(|(_, value)| value.into_owned())
        .ok_or(MalformedUri::MissingVideoId)
}

/// Decides between the player app and the web URL for a record
#[derive(Debug)]
pub struct LaunchResolver<T> {
    target: T,
    player_scheme: String,
}

impl<T: LaunchTarget> LaunchResolver<T> {
    pub fn new(target: T, player_scheme: impl Into<String>) -> Self {
        Self {
            target,
            player_scheme: player_scheme.into(),
        }
    }

    pub fn player_scheme(&self) -> &str {
        &self.player_scheme
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    /// `<scheme>:<v>` for the record's playback URL.
    ///
    /// An unparsable URL or a missing `v` yields `<scheme>:` with an empty
    /// payload.
    pub fn launch_uri(&self, video: &VideoRecord) -> String {
        let id = extract_video_id(video.url()).unwrap_or_else(|err| {
            debug!("No video id in {}: {}", video.url(), err);
            String::new()
        });
        format!("{}:{}", self.player_scheme, id)
    }

    /// Pick the launch target without opening anything
    pub fn resolve(&self, video: &VideoRecord) -> LaunchDecision {
        let deep_link = self.launch_uri(video);
        if self.target.can_open(&deep_link) {
            LaunchDecision::App(deep_link)
        } else {
            debug!("No handler for {}, falling back to web", deep_link);
            LaunchDecision::Web(video.url().to_string())
        }
    }

    /// Resolve and open. An open failure is logged, the decision is still returned.
    pub fn launch(&self, video: &VideoRecord) -> LaunchDecision {
        let decision = self.resolve(video);
        match self.target.open(decision.uri()) {
            Ok(()) => info!("Opened {}", decision.uri()),
            Err(err) => warn!("Failed to open {}: {}", decision.uri(), err),
        }
        decision
    }
}

/// Launch target backed by the desktop's URI handler registry
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLaunchTarget;

impl SystemLaunchTarget {
    pub fn new() -> Self {
        Self
    }
}

impl LaunchTarget for SystemLaunchTarget {
    fn can_open(&self, uri: &str) -> bool {
        let Some((scheme, payload)) = uri.split_once(':') else {
            return false;
        };
        if payload.is_empty() {
            return false;
        }
        if scheme == "http" || scheme == "https" {
            return true;
        }
        has_scheme_handler(scheme)
    }

    fn open(&self, uri: &str) -> AppResult<()> {
        open_with_default_handler(uri)
    }
}

#[cfg(target_os = "linux")]
fn has_scheme_handler(scheme: &str) -> bool {
    match Command::new("xdg-mime")
        .args(["query", "default", &format!("x-scheme-handler/{scheme}")])
        .output()
    {
        Ok(output) => {
            output.status.success() && !String::from_utf8_lossy(&output.stdout).trim().is_empty()
        }
        Err(e) => {
            debug!("xdg-mime unavailable: {}", e);
            false
        }
    }
}

#[cfg(target_os = "windows")]
fn has_scheme_handler(scheme: &str) -> bool {
    Command::new("reg")
        .args(["query", &format!("HKCR\\{scheme}"), "/v", "URL Protocol"])
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
fn has_scheme_handler(scheme: &str) -> bool {
    debug!("No handler probe for scheme {} on this platform", scheme);
    false
}

fn open_with_default_handler(uri: &str) -> AppResult<()> {
    #[cfg(target_os = "windows")]
    let command = {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", "", uri]);
        command
    };

    #[cfg(target_os = "macos")]
    let command = {
        let mut command = Command::new("open");
        command.arg(uri);
        command
    };

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let command = {
        let mut command = Command::new("xdg-open");
        command.arg(uri);
        command
    };

    spawn_detached(command, uri)
}

/// Start `command` without waiting on it; a reaper thread logs how it exited
fn spawn_detached(mut command: Command, uri: &str) -> AppResult<()> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| AppError::Launch(format!("Failed to open {}: {}", uri, e)))?;

    let uri = uri.to_string();
    let reaper = std::thread::Builder::new()
        .name("launch-reaper".into())
        .spawn(move || match child.wait() {
            Ok(status) if status.success() => debug!("Opener for {} finished", uri),
            Ok(status) => warn!("Opener for {} exited with {}", uri, status),
            Err(e) => warn!("Lost track of opener for {}: {}", uri, e),
        });
    if let Err(e) = reaper {
        debug!("No reaper thread for opener: {}", e);
    }
    Ok(())
}
