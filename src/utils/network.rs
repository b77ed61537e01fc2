//! Network helpers for the playlist host

use std::time::Duration;
use tracing::debug;

/// User agent sent with playlist requests
pub fn get_user_agent() -> &'static str {
    concat!("DevByteViewer/", env!("CARGO_PKG_VERSION"))
}

/// Whether the host behind `url` answers within `timeout`.
///
/// Any response short of a server error counts. Used after a failed refresh
/// to tell an offline host from a bad payload.
pub async fn check_connectivity(url: &str, timeout: Duration) -> bool {
    let client = match reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(get_user_agent())
        .build()
    {
        Ok(client) => client,
        Err(err) => {
            debug!("Cannot build connectivity client: {}", err);
            return false;
        }
    };

    match client.head(url).send().await {
        Ok(response) => !response.status().is_server_error(),
        Err(err) => {
            debug!("Connectivity check for {} failed: {}", url, err);
            false
        }
    }
}
