//! Telegram Bot API adapters
//!
//! A single [`TelegramClient`] is shared by the messenger and the update feed.
//! It wraps one `reqwest::Client`, which is safe to use from both tasks at once.

mod send;
mod updates;

pub use send::TelegramMessenger;
pub use updates::TelegramUpdateFeed;

use reqwest::Client;
use room_watch_domain::{DeliveryError, UpdateError};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Errors from a single Bot API call
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Telegram API error {code}: {description}")]
    Api {
        code: u16,
        description: String,
        retry_after: Option<u64>,
    },
    #[error("Malformed Telegram response (HTTP {status}): {message}")]
    Decode { status: u16, message: String },
}

impl From<TelegramError> for DeliveryError {
    fn from(error: TelegramError) -> Self {
        match error {
            TelegramError::Network(message) => DeliveryError::Network(message),
            TelegramError::Api {
                code: 429,
                retry_after,
                ..
            } => DeliveryError::RateLimited(retry_after.map(Duration::from_secs)),
            TelegramError::Api {
                code, description, ..
            } => DeliveryError::Api { code, description },
            TelegramError::Decode { status, message } => DeliveryError::Api {
                code: status,
                description: message,
            },
        }
    }
}

impl From<TelegramError> for UpdateError {
    fn from(error: TelegramError) -> Self {
        match error {
            TelegramError::Network(message) => UpdateError::Network(message),
            TelegramError::Api {
                code: 403,
                description,
                ..
            } => UpdateError::Forbidden(description),
            TelegramError::Api {
                code, description, ..
            } if code >= 500 => UpdateError::Network(format!("{}: {}", code, description)),
            TelegramError::Decode { status, message } if status >= 500 => {
                UpdateError::Network(format!("{}: {}", status, message))
            }
            other => UpdateError::Api(other.to_string()),
        }
    }
}

/// Target of outbound messages: a numeric chat id or an `@channel` username
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ChatTarget {
    Id(i64),
    Username(String),
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid chat id {0:?}: expected a number or an @username")]
pub struct InvalidChatTarget(String);

impl FromStr for ChatTarget {
    type Err = InvalidChatTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(id) = s.parse::<i64>() {
            return Ok(Self::Id(id));
        }
        if s.len() > 1 && s.starts_with('@') && !s.contains(char::is_whitespace) {
            return Ok(Self::Username(s.to_string()));
        }
        Err(InvalidChatTarget(s.to_string()))
    }
}

impl std::fmt::Display for ChatTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id),
            Self::Username(name) => f.write_str(name),
        }
    }
}

#[derive(Deserialize)]
struct ApiResponse<R> {
    ok: bool,
    result: Option<R>,
    error_code: Option<u16>,
    description: Option<String>,
    parameters: Option<ResponseParameters>,
}

#[derive(Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

/// Shared Bot API transport
pub struct TelegramClient {
    client: Client,
    token: SecretString,
    api_url: String,
}

impl TelegramClient {
    pub fn with_api_url(token: SecretString, api_url: String) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            token,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Invoke a Bot API method with a JSON payload
    ///
    /// `timeout` overrides the client default, for long polls.
    pub(crate) async fn call<P, R>(
        &self,
        method: &str,
        payload: &P,
        timeout: Option<Duration>,
    ) -> Result<R, TelegramError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!(
            "{}/bot{}/{}",
            self.api_url,
            self.token.expose_secret(),
            method
        );

        let mut request = self.client.post(&url).json(payload);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        // Errors are stripped of the URL, which embeds the token
        let response = request
            .send()
            .await
            .map_err(|e| TelegramError::Network(e.without_url().to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TelegramError::Network(e.without_url().to_string()))?;

        let envelope: ApiResponse<R> =
            serde_json::from_slice(&body).map_err(|e| TelegramError::Decode {
                status,
                message: e.to_string(),
            })?;

        if !envelope.ok {
            return Err(TelegramError::Api {
                code: envelope.error_code.unwrap_or(status),
                description: envelope.description.unwrap_or_default(),
                retry_after: envelope.parameters.and_then(|p| p.retry_after),
            });
        }

        envelope.result.ok_or_else(|| TelegramError::Decode {
            status,
            message: format!("{} returned no result", method),
        })
    }
}
