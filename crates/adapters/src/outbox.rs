//! Outbox messenger for dry runs.

use async_trait::async_trait;
use room_watch_domain::{DeliveryError, Messenger, Notification};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct OutboxWriter {
    path: PathBuf,
    file: Arc<Mutex<tokio::fs::File>>,
}

impl OutboxWriter {
    pub async fn new(path: PathBuf) -> Result<Self, OutboxError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, entry: &OutboxEntry<'_>) -> Result<(), OutboxError> {
        let line = serde_json::to_string(entry)?;
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }
}

/// Messenger that writes notifications to the outbox instead of a chat
#[derive(Debug, Clone)]
pub struct OutboxMessenger {
    writer: OutboxWriter,
}

impl OutboxMessenger {
    pub fn new(writer: OutboxWriter) -> Self {
        Self { writer }
    }
}

#[derive(Serialize)]
struct OutboxEntry<'a> {
    listing_id: &'a str,
    photo_url: &'a str,
    caption: &'a str,
    action_label: &'a str,
    action_url: &'a str,
}

#[async_trait]
impl Messenger for OutboxMessenger {
    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let entry = OutboxEntry {
            listing_id: &notification.listing_id,
            photo_url: &notification.photo_url,
            caption: &notification.caption,
            action_label: &notification.action_label,
            action_url: &notification.action_url,
        };

        self.writer
            .append(&entry)
            .await
            .map_err(|error| DeliveryError::Outbox(error.to_string()))?;

        tracing::info!(
            listing_id = %notification.listing_id,
            outbox = %self.writer.path().display(),
            "Notification written to outbox"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::TempDir;

    fn notification(id: &str) -> Notification {
        Notification {
            listing_id: id.to_string(),
            caption: "<b>Kruisstraat 12</b>\nStudio\n\nTotal Price: <b>€ 612,40</b>".to_string(),
            photo_url: format!("https://rooms.vestide.nl/img/{}.jpg", id),
            action_label: "Apply".to_string(),
            action_url: format!(
                "https://rooms.vestide.nl/en/find-room/detail-accommodation/?detailId={}",
                id
            ),
        }
    }

    #[tokio::test]
    async fn outbox_messenger_writes_jsonl_entries() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("out").join("outbox.jsonl");

        let writer = OutboxWriter::new(path.clone()).await.expect("writer");
        let messenger = OutboxMessenger::new(writer);

        messenger.send(&notification("4411")).await.expect("send");
        messenger.send(&notification("4412")).await.expect("send");

        let contents = tokio::fs::read_to_string(&path).await.expect("read outbox");
        let lines: Vec<Value> = contents
            .lines()
            .map(|line| serde_json::from_str(line).expect("valid json"))
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["listing_id"], "4411");
        assert_eq!(lines[0]["photo_url"], "https://rooms.vestide.nl/img/4411.jpg");
        assert_eq!(lines[0]["action_label"], "Apply");
        assert!(lines[0]["caption"].as_str().unwrap().contains("Kruisstraat 12"));
        assert_eq!(lines[1]["listing_id"], "4412");
    }
}
