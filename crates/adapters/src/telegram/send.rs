//! Telegram messenger: delivers listing notifications as photo messages

use async_trait::async_trait;
use room_watch_domain::{DeliveryError, Messenger, Notification};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ChatTarget, TelegramClient};

/// Sends one photo message per notification to a fixed chat
pub struct TelegramMessenger {
    client: Arc<TelegramClient>,
    chat: ChatTarget,
}

impl TelegramMessenger {
    pub fn new(client: Arc<TelegramClient>, chat: ChatTarget) -> Self {
        Self { client, chat }
    }
}

#[derive(Serialize)]
struct SendPhotoRequest<'a> {
    chat_id: &'a ChatTarget,
    photo: &'a str,
    caption: &'a str,
    parse_mode: &'static str,
    reply_markup: InlineKeyboardMarkup<'a>,
}

#[derive(Serialize)]
struct InlineKeyboardMarkup<'a> {
    inline_keyboard: Vec<Vec<InlineKeyboardButton<'a>>>,
}

#[derive(Serialize)]
struct InlineKeyboardButton<'a> {
    text: &'a str,
    url: &'a str,
}

#[derive(Deserialize)]
struct SentMessage {
    message_id: i64,
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
        tracing::info!(
            listing_id = %notification.listing_id,
            chat = %self.chat,
            "Sending notification"
        );

        let request = SendPhotoRequest {
            chat_id: &self.chat,
            photo: &notification.photo_url,
            caption: &notification.caption,
            parse_mode: "HTML",
            reply_markup: InlineKeyboardMarkup {
                inline_keyboard: vec![vec![InlineKeyboardButton {
                    text: &notification.action_label,
                    url: &notification.action_url,
                }]],
            },
        };

        let sent: SentMessage = self.client.call("sendPhoto", &request, None).await?;

        tracing::debug!(
            listing_id = %notification.listing_id,
            message_id = sent.message_id,
            "Notification delivered"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notification() -> Notification {
        Notification {
            listing_id: "4411".to_string(),
            caption: "<b>Kruisstraat 12</b>\nStudio\n\nTotal Price: <b>€ 612,40</b>".to_string(),
            photo_url: "https://rooms.vestide.nl/img/4411.jpg".to_string(),
            action_label: "Apply".to_string(),
            action_url: "https://rooms.vestide.nl/en/find-room/detail-accommodation/?detailId=4411"
                .to_string(),
        }
    }

    fn messenger(server: &MockServer, chat: ChatTarget) -> TelegramMessenger {
        let client =
            TelegramClient::with_api_url(SecretString::new("test-token".into()), server.uri())
                .unwrap();
        TelegramMessenger::new(Arc::new(client), chat)
    }

    #[tokio::test]
    async fn test_send_photo_payload() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bottest-token/sendPhoto"))
            .and(body_partial_json(serde_json::json!({
                "chat_id": -100123,
                "photo": "https://rooms.vestide.nl/img/4411.jpg",
                "parse_mode": "HTML",
                "reply_markup": {
                    "inline_keyboard": [[{
                        "text": "Apply",
                        "url": "https://rooms.vestide.nl/en/find-room/detail-accommodation/?detailId=4411"
                    }]]
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": {"message_id": 77, "chat": {"id": -100123}}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let messenger = messenger(&mock_server, ChatTarget::Id(-100123));

        messenger.send(&notification()).await.unwrap();
    }

    #[tokio::test]
    async fn test_send_to_channel_username() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bottest-token/sendPhoto"))
            .and(body_partial_json(serde_json::json!({"chat_id": "@rooms"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": {"message_id": 1}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let messenger = messenger(&mock_server, ChatTarget::Username("@rooms".to_string()));

        messenger.send(&notification()).await.unwrap();
    }

    #[tokio::test]
    async fn test_send_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bottest-token/sendPhoto"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: wrong file identifier/HTTP URL specified"
            })))
            .mount(&mock_server)
            .await;

        let messenger = messenger(&mock_server, ChatTarget::Id(1));
        let result = messenger.send(&notification()).await;

        assert!(matches!(
            result,
            Err(DeliveryError::Api { code: 400, ref description }) if description.contains("wrong file")
        ));
    }

    #[tokio::test]
    async fn test_send_rate_limited() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bottest-token/sendPhoto"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 429,
                "description": "Too Many Requests: retry after 3",
                "parameters": {"retry_after": 3}
            })))
            .mount(&mock_server)
            .await;

        let messenger = messenger(&mock_server, ChatTarget::Id(1));
        let result = messenger.send(&notification()).await;

        assert!(matches!(result, Err(DeliveryError::RateLimited(Some(_)))));
    }

    #[tokio::test]
    async fn test_network_error_does_not_leak_token() {
        let client = TelegramClient::with_api_url(
            SecretString::new("secret-token".into()),
            "http://127.0.0.1:1".to_string(),
        )
        .unwrap();
        let messenger = TelegramMessenger::new(Arc::new(client), ChatTarget::Id(1));

        let error = messenger.send(&notification()).await.unwrap_err();

        assert!(matches!(error, DeliveryError::Network(_)));
        assert!(!error.to_string().contains("secret-token"));
    }
}
