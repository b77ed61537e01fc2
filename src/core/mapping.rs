//! Network to domain conversion
//!
//! Network objects only describe the wire format. Everything past the fetcher
//! works with [`VideoRecord`]s produced here.

use crate::core::models::{NetworkVideo, NetworkVideoContainer, VideoRecord};

/// Map raw entries to records, one per entry, in the order the remote sent them.
///
/// Closed captions are not carried into the record used for display.
pub fn as_domain_model<I>(entries: I) -> Vec<VideoRecord>
where
    I: IntoIterator<Item = NetworkVideo>,
{
    entries.into_iter().map(VideoRecord::from).collect()
}

impl From<NetworkVideo> for VideoRecord {
    fn from(video: NetworkVideo) -> Self {
        VideoRecord::new(
            video.title,
            video.description,
            video.url,
            video.updated,
            video.thumbnail,
        )
    }
}

impl NetworkVideoContainer {
    pub fn into_domain_model(self) -> Vec<VideoRecord> {
        as_domain_model(self.videos)
    }
}
