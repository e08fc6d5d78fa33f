//! Domain models and value objects

use serde::{Deserialize, Deserializer, de};
use serde_json::Value;

/// A housing listing as published by the upstream API
///
/// Only `id` takes part in de-duplication. Every other field is display-only
/// and is accepted as-is, whatever scalar type the upstream happens to send.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Listing {
    /// Stable upstream identifier, the sole dedup key
    #[serde(deserialize_with = "identifier")]
    pub id: String,
    /// Street name and house number
    #[serde(rename = "straatnaamEnHuisnummer", default, deserialize_with = "lenient_string")]
    pub address: String,
    /// Advertisement title
    #[serde(rename = "advertentietitel", default, deserialize_with = "lenient_string")]
    pub title: String,
    /// Total rent, pre-formatted by the upstream
    #[serde(rename = "totaleHuur", default, deserialize_with = "lenient_string")]
    pub total_rent: String,
    /// Scheme-relative photo reference (e.g. `//host/path.jpg`)
    #[serde(rename = "fotoURI", default, deserialize_with = "lenient_string")]
    pub photo_uri: String,
}

fn scalar_to_string(value: Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Value>::deserialize(deserializer).map(scalar_to_string)
}

fn identifier<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let id = scalar_to_string(Option::<Value>::deserialize(deserializer)?);
    if id.trim().is_empty() {
        return Err(de::Error::custom("listing id is empty"));
    }
    Ok(id)
}

/// A rendered message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Listing the message was rendered from
    pub listing_id: String,
    /// HTML caption
    pub caption: String,
    /// Absolute photo URL
    pub photo_url: String,
    /// Label of the single inline button
    pub action_label: String,
    /// Target of the inline button
    pub action_url: String,
}

/// One item from the bot's inbound update stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundUpdate {
    pub update_id: i64,
    pub message: Option<InboundMessage>,
}

/// A chat message carried by an inbound update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub chat_id: i64,
    pub message_id: i64,
    /// Absent for stickers, photos and other non-text messages
    pub text: Option<String>,
}

/// Offset into the inbound update stream
///
/// Holds the id of the next update to request. It only ever moves forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateCursor(Option<i64>);

impl UpdateCursor {
    /// A cursor positioned at `update_id`, which will be requested again
    pub fn at(update_id: i64) -> Self {
        Self(Some(update_id))
    }

    pub fn offset(&self) -> Option<i64> {
        self.0
    }

    /// Move past `update_id` so it is not delivered again
    pub fn advance_past(&mut self, update_id: i64) {
        let next = update_id.saturating_add(1);
        if self.0.is_none_or(|current| next > current) {
            self.0 = Some(next);
        }
    }

    /// Skip one position; no-op while unset
    pub fn bump(&mut self) {
        if let Some(current) = self.0.as_mut() {
            *current = current.saturating_add(1);
        }
    }
}

/// Summary of one completed poll cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Listings returned by the upstream
    pub fetched: usize,
    /// Listings skipped because they were already notified
    pub already_seen: usize,
    /// Records dropped because they carried no usable identifier
    pub malformed: usize,
    /// Identifiers notified and recorded this cycle, in upstream order
    pub notified: Vec<String>,
}
