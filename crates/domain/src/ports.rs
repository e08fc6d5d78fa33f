//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{InboundUpdate, Notification};

/// Error type for listing source operations
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Listing request failed: {0}")]
    Transport(String),
    #[error("Listing API returned status {0}")]
    Status(u16),
    #[error("Listing API response is not valid JSON: {0}")]
    Decode(String),
}

/// Port for fetching the current listing inventory
///
/// Implementations issue exactly one request and never retry.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch the raw decoded payload
    async fn fetch(&self) -> Result<serde_json::Value, FetchError>;
}

/// Error type for notification delivery
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("API error {code}: {description}")]
    Api { code: u16, description: String },
    #[error("Rate limited, retry after: {0:?}")]
    RateLimited(Option<Duration>),
    #[error("Outbox write failed: {0}")]
    Outbox(String),
}

/// Port for delivering one notification to the target chat
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send the notification; no internal retries
    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError>;
}

/// Error type for seen-set store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Seen-set store {location} is corrupt: {message}")]
    Corrupt { location: String, message: String },
    #[error("Database error: {0}")]
    Database(String),
}

/// Port for the durable, append-only record of notified listings
#[async_trait]
pub trait SeenStore: Send + Sync {
    /// Read every recorded identifier; an absent store yields an empty set
    async fn load(&self) -> Result<HashSet<String>, StoreError>;

    /// Durably append one identifier before returning
    async fn append(&self, id: &str) -> Result<(), StoreError>;
}

/// Error type for inbound update operations
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("API error: {0}")]
    Api(String),
}

/// Port for the bot's inbound message stream
#[async_trait]
pub trait UpdateFeed: Send + Sync {
    /// Long-poll for updates with id >= `offset`, waiting at most `timeout`
    async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout: Duration,
    ) -> Result<Vec<InboundUpdate>, UpdateError>;

    /// Send a plain text message to a chat
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), UpdateError>;
}
