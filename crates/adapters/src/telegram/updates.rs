//! Telegram update feed backed by `getUpdates` long polling

use async_trait::async_trait;
use room_watch_domain::{InboundMessage, InboundUpdate, UpdateError, UpdateFeed};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::TelegramClient;

/// Slack added on top of the long-poll timeout before the request is abandoned
const POLL_GRACE: Duration = Duration::from_secs(10);

pub struct TelegramUpdateFeed {
    client: Arc<TelegramClient>,
}

impl TelegramUpdateFeed {
    pub fn new(client: Arc<TelegramClient>) -> Self {
        Self { client }
    }
}

#[derive(Serialize)]
struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Deserialize)]
struct RawUpdate {
    update_id: i64,
    message: Option<RawMessage>,
}

#[derive(Deserialize)]
struct RawMessage {
    message_id: i64,
    chat: RawChat,
    text: Option<String>,
}

#[derive(Deserialize)]
struct RawChat {
    id: i64,
}

impl From<RawUpdate> for InboundUpdate {
    fn from(raw: RawUpdate) -> Self {
        InboundUpdate {
            update_id: raw.update_id,
            message: raw.message.map(|m| InboundMessage {
                chat_id: m.chat.id,
                message_id: m.message_id,
                text: m.text,
            }),
        }
    }
}

#[async_trait]
impl UpdateFeed for TelegramUpdateFeed {
    async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout: Duration,
    ) -> Result<Vec<InboundUpdate>, UpdateError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout.as_secs(),
            allowed_updates: ["message"],
        };

        let raw: Vec<RawUpdate> = self
            .client
            .call("getUpdates", &request, Some(timeout + POLL_GRACE))
            .await?;

        tracing::trace!(count = raw.len(), ?offset, "Received updates");
        Ok(raw.into_iter().map(InboundUpdate::from).collect())
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), UpdateError> {
        let request = SendMessageRequest { chat_id, text };
        let _: serde_json::Value = self.client.call("sendMessage", &request, None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use wiremock::matchers::{body_json, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn feed(server: &MockServer) -> TelegramUpdateFeed {
        let client =
            TelegramClient::with_api_url(SecretString::new("test-token".into()), server.uri())
                .unwrap();
        TelegramUpdateFeed::new(Arc::new(client))
    }

    #[tokio::test]
    async fn test_get_updates_parses_messages() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bottest-token/getUpdates"))
            .and(body_partial_json(serde_json::json!({"offset": 41, "timeout": 10})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": [
                    {
                        "update_id": 41,
                        "message": {
                            "message_id": 9,
                            "date": 1700000000,
                            "chat": {"id": 555, "type": "private"},
                            "text": "hello"
                        }
                    },
                    {
                        "update_id": 42,
                        "message": {
                            "message_id": 10,
                            "chat": {"id": 555, "type": "private"},
                            "sticker": {"file_id": "abc"}
                        }
                    },
                    {"update_id": 43, "edited_message": {"message_id": 9}}
                ]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let updates = feed(&mock_server)
            .get_updates(Some(41), Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(updates.len(), 3);
        assert_eq!(
            updates[0].message,
            Some(InboundMessage {
                chat_id: 555,
                message_id: 9,
                text: Some("hello".to_string()),
            })
        );
        assert_eq!(updates[1].message.as_ref().and_then(|m| m.text.as_ref()), None);
        assert_eq!(updates[2].update_id, 43);
        assert!(updates[2].message.is_none());
    }

    #[tokio::test]
    async fn test_get_updates_omits_unset_offset() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bottest-token/getUpdates"))
            .and(body_json(serde_json::json!({
                "timeout": 0,
                "allowed_updates": ["message"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": []
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let updates = feed(&mock_server)
            .get_updates(None, Duration::ZERO)
            .await
            .unwrap();

        assert!(updates.is_empty());
    }

    #[tokio::test]
    async fn test_send_text_forbidden() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bottest-token/sendMessage"))
            .and(body_json(serde_json::json!({"chat_id": 555, "text": "hello"})))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 403,
                "description": "Forbidden: bot was blocked by the user"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = feed(&mock_server).send_text(555, "hello").await;

        assert!(matches!(result, Err(UpdateError::Forbidden(ref d)) if d.contains("blocked")));
    }

    #[tokio::test]
    async fn test_send_text_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bottest-token/sendMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": {"message_id": 11, "chat": {"id": 555}, "text": "hello"}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        feed(&mock_server).send_text(555, "hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_gateway_error_is_transient() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bottest-token/getUpdates"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&mock_server)
            .await;

        let result = feed(&mock_server)
            .get_updates(Some(1), Duration::from_secs(1))
            .await;

        assert!(matches!(result, Err(UpdateError::Network(_))));
    }
}
