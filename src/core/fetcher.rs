//! Remote playlist fetcher
//!
//! One fixed resource, no request parameters. Retry and backoff are left to
//! whoever schedules refreshes.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::core::models::{NetworkVideo, NetworkVideoContainer, TransportError};

/// Source of raw playlist entries
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Name of the source (for logging)
    fn name(&self) -> &str;

    /// Fetch the whole remote playlist in one call
    async fn fetch_all(&self) -> Result<Vec<NetworkVideo>, TransportError>;
}

/// HTTP fetcher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Absolute URL of the playlist resource
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout: u64,
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://android-kotlin-fun-mars-server.appspot.com/devbytes".to_string(),
            timeout: 30,
            user_agent: crate::utils::network::get_user_agent().to_string(),
        }
    }
}

/// Fetches `{"videos": [...]}` over HTTP
#[derive(Debug, Clone)]
pub struct HttpVideoSource {
    client: Client,
    config: FetcherConfig,
}

impl HttpVideoSource {
    pub fn new(config: FetcherConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl VideoSource for HttpVideoSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_all(&self) -> Result<Vec<NetworkVideo>, TransportError> {
        debug!("Fetching playlist from {}", self.config.endpoint);

        let response = self.client.get(&self.config.endpoint).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let container: NetworkVideoContainer = serde_json::from_slice(&body)?;

        debug!(
            "Fetched {} entries ({} bytes) from {}",
            container.videos.len(),
            body.len(),
            self.config.endpoint
        );
        Ok(container.videos)
    }
}
