/// HTTP client for the backend read endpoints
///
/// The dashboard never talks to reqwest directly; it goes through the
/// `DashboardApi` trait so the whole fetch/transition path can be driven
/// with a mock in tests.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::core::config::Settings;
use crate::core::metrics::{GreetingPayload, HealthPayload, SystemSnapshot};

/// Everything that can go wrong with a fetch. The dashboard collapses all
/// of these into one display string; the variants exist so the status
/// command and logs can still tell transport from server from payload.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned HTTP {0}")]
    Status(u16),

    #[error("invalid response payload: {0}")]
    Decode(#[from] serde_json::Error),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn fetch_greeting(&self) -> Result<GreetingPayload, ApiError>;
    async fn fetch_snapshot(&self) -> Result<SystemSnapshot, ApiError>;
}

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Liveness probe, used by the status command
    pub async fn check_health(&self) -> Result<HealthPayload, ApiError> {
        self.get_json("/health").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "fetching");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        // Decode from the raw body so a malformed payload is distinguishable
        // from a transport failure
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl DashboardApi for ApiClient {
    async fn fetch_greeting(&self) -> Result<GreetingPayload, ApiError> {
        self.get_json("/api/v1/hello").await
    }

    async fn fetch_snapshot(&self) -> Result<SystemSnapshot, ApiError> {
        self.get_json("/api/v1/info").await
    }
}
