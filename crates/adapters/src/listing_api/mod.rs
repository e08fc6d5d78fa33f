//! Upstream listing API adapter

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use room_watch_domain::{FetchError, ListingSource};
use serde_json::Value;
use std::time::Duration;

/// Path of the living-space inventory endpoint
pub const LISTINGS_PATH: &str = "/api/accommodation/getlivingspaces/";

/// Page size large enough to cover the whole inventory in one request
pub const DEFAULT_TAKE: u32 = 999;

/// HTTP listing source for the upstream inventory endpoint
pub struct HttpListingSource {
    client: Client,
    base_url: String,
    take: u32,
}

impl HttpListingSource {
    pub fn new(base_url: impl Into<String>) -> reqwest::Result<Self> {
        Self::with_options(base_url, DEFAULT_TAKE, Duration::from_secs(30))
    }

    pub fn with_options(
        base_url: impl Into<String>,
        take: u32,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            take,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, LISTINGS_PATH)
    }
}

#[async_trait]
impl ListingSource for HttpListingSource {
    async fn fetch(&self) -> Result<Value, FetchError> {
        let url = self.endpoint();
        tracing::debug!(url = %url, take = self.take, "Fetching listings");

        let response = self
            .client
            .get(&url)
            .query(&[("Skip", 0), ("Take", self.take)])
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}
