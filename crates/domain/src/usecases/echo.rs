//! Echo responder - replies to inbound text messages with the same text
//!
//! Runs independently of the poll loop. The only thing the two share is the
//! transport behind the [`UpdateFeed`] and [`crate::Messenger`] ports.

use std::sync::Arc;

use tokio::time::{Duration, sleep};

use crate::{
    model::{InboundUpdate, UpdateCursor},
    ports::{UpdateError, UpdateFeed},
};

/// Configuration for the echo responder
#[derive(Debug, Clone)]
pub struct EchoConfig {
    /// Server-side wait of each long-poll request
    pub poll_timeout: Duration,
    /// Pause after a recoverable transport error
    pub retry_pause: Duration,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(10),
            retry_pause: Duration::from_secs(5),
        }
    }
}

/// Long-polling echo loop with its own update cursor
pub struct EchoResponder<F: UpdateFeed + ?Sized> {
    feed: Arc<F>,
    cursor: UpdateCursor,
    config: EchoConfig,
}

impl<F: UpdateFeed + ?Sized> EchoResponder<F> {
    /// Position the cursor at the most recent pending update, if any
    pub async fn init(feed: Arc<F>, config: EchoConfig) -> Self {
        let cursor = match feed.get_updates(None, Duration::ZERO).await {
            Ok(updates) => updates
                .iter()
                .map(|u| u.update_id)
                .max()
                .map(UpdateCursor::at)
                .unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read pending updates, starting without cursor");
                UpdateCursor::default()
            }
        };

        tracing::info!(cursor = ?cursor.offset(), "Listening for new messages");
        Self {
            feed,
            cursor,
            config,
        }
    }

    pub fn cursor(&self) -> UpdateCursor {
        self.cursor
    }

    /// One long-poll round; returns the number of updates consumed
    ///
    /// On a transport error the cursor stays on the failed update.
    pub async fn poll_once(&mut self) -> Result<usize, UpdateError> {
        let updates = self
            .feed
            .get_updates(self.cursor.offset(), self.config.poll_timeout)
            .await?;

        let mut consumed = 0;
        for update in updates {
            match self.respond(&update).await {
                Ok(()) => {}
                Err(UpdateError::Forbidden(reason)) => {
                    tracing::warn!(
                        update_id = update.update_id,
                        reason = %reason,
                        "Bot was blocked by the chat, skipping update"
                    );
                }
                Err(e) => return Err(e),
            }
            self.cursor.advance_past(update.update_id);
            consumed += 1;
        }

        Ok(consumed)
    }

    async fn respond(&self, update: &InboundUpdate) -> Result<(), UpdateError> {
        let Some(message) = &update.message else {
            return Ok(());
        };
        let Some(text) = &message.text else {
            return Ok(());
        };

        tracing::info!(
            chat_id = message.chat_id,
            message_id = message.message_id,
            text = %text,
            "Found message"
        );
        self.feed.send_text(message.chat_id, text).await
    }

    /// One round with the error policy applied
    pub async fn step(&mut self) {
        match self.poll_once().await {
            Ok(_) => {}
            Err(UpdateError::Forbidden(reason)) => {
                self.cursor.bump();
                tracing::warn!(
                    reason = %reason,
                    cursor = ?self.cursor.offset(),
                    "Update poll forbidden, moving cursor on"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "Update poll failed, retrying");
                sleep(self.config.retry_pause).await;
            }
        }
    }

    pub async fn run(mut self) {
        loop {
            self.step().await;
        }
    }
}
