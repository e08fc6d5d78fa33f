//! Flat-file seen-set store
//!
//! The file holds a header line `id` followed by one identifier per record.
//! Identifiers containing a comma, a quote, a line break or surrounding
//! whitespace are written as CSV quoted fields (`"a, ""b"""`).
//! Every append is flushed and synced to disk before it returns.

use async_trait::async_trait;
use room_watch_domain::{SeenStore, StoreError};
use std::borrow::Cow;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

const HEADER: &str = "id";

/// Line-oriented store backed by a single file
pub struct FileSeenStore {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSeenStore {
    /// Open the store, creating the file with its header if it is missing or empty
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        let existing = fs::read(&path).await?;
        if existing.is_empty() {
            file.write_all(format!("{}\n", HEADER).as_bytes()).await?;
            file.flush().await?;
            file.sync_data().await?;
            tracing::info!(path = %path.display(), "Created seen-set file");
        } else if !existing.ends_with(b"\n") {
            // Keep the next append on its own line
            file.write_all(b"\n").await?;
            file.flush().await?;
        }

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Read the recorded identifiers without creating or repairing the file
    ///
    /// A missing file yields an empty set.
    pub async fn read_ids(path: impl AsRef<Path>) -> Result<HashSet<String>, StoreError> {
        let path = path.as_ref();
        match fs::read(path).await {
            Ok(bytes) => parse(&bytes).map_err(|message| StoreError::Corrupt {
                location: path.display().to_string(),
                message,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(HashSet::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn parse(bytes: &[u8]) -> Result<HashSet<String>, String> {
    let text = std::str::from_utf8(bytes).map_err(|e| format!("not valid UTF-8: {}", e))?;

    let mut records = split_records(text)?.into_iter();
    match records.next() {
        None => return Ok(HashSet::new()),
        Some(header) if header == HEADER => {}
        Some(other) => {
            return Err(format!("expected header {:?}, found {:?}", HEADER, other));
        }
    }

    Ok(records.collect())
}

/// Split the file body into records, honouring quoted fields
///
/// Blank lines are skipped. A quoted field may span lines and escapes a
/// quote by doubling it.
fn split_records(text: &str) -> Result<Vec<String>, String> {
    let mut records = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1;

    while chars.peek().is_some() {
        let start = line;

        if chars.peek() == Some(&'"') {
            chars.next();
            let mut value = String::new();
            loop {
                match chars.next() {
                    None => return Err(format!("line {}: unterminated quoted identifier", start)),
                    Some('"') if chars.peek() == Some(&'"') => {
                        chars.next();
                        value.push('"');
                    }
                    Some('"') => break,
                    Some(c) => {
                        if c == '\n' {
                            line += 1;
                        }
                        value.push(c);
                    }
                }
            }

            if chars.peek() == Some(&'\r') {
                chars.next();
            }
            match chars.next() {
                None => {}
                Some('\n') => line += 1,
                Some(_) => {
                    return Err(format!("line {}: unexpected text after closing quote", line));
                }
            }

            if value.is_empty() {
                return Err(format!("line {}: empty identifier", start));
            }
            records.push(value);
        } else {
            let mut value: String = chars.by_ref().take_while(|&c| c != '\n').collect();
            line += 1;
            if value.ends_with('\r') {
                value.pop();
            }
            if value.is_empty() {
                continue;
            }
            if let Some(reason) = unquoted_reason(&value) {
                return Err(format!("line {}: {}", start, reason));
            }
            records.push(value);
        }
    }

    Ok(records)
}

/// Why an identifier cannot be stored without quotes, if it cannot
fn unquoted_reason(id: &str) -> Option<&'static str> {
    if id.contains(',') {
        Some("identifier contains a comma")
    } else if id.contains('"') {
        Some("identifier contains a quote")
    } else if id.trim() != id {
        Some("identifier has surrounding whitespace")
    } else if id.contains(['\n', '\r']) {
        Some("identifier contains a line break")
    } else {
        None
    }
}

fn encode_id(id: &str) -> Cow<'_, str> {
    if unquoted_reason(id).is_some() {
        Cow::Owned(format!("\"{}\"", id.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(id)
    }
}

#[async_trait]
impl SeenStore for FileSeenStore {
    async fn load(&self) -> Result<HashSet<String>, StoreError> {
        Self::read_ids(&self.path).await
    }

    async fn append(&self, id: &str) -> Result<(), StoreError> {
        if id.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty identifier").into());
        }

        let mut file = self.file.lock().await;
        file.write_all(format!("{}\n", encode_id(id)).as_bytes()).await?;
        file.flush().await?;
        file.sync_data().await?;

        tracing::trace!(id, path = %self.path.display(), "Appended to seen-set file");
        Ok(())
    }
}
