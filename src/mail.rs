//! Attachment source port: a black-box provider of email attachments.

use crate::error::{EtlError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Query filter applied when searching the mailbox.
#[derive(Debug, Clone)]
pub struct MailFilter {
    /// Substring match on the subject line.
    pub subject: String,
    /// Exact sender address.
    pub sender: String,
}

#[async_trait]
pub trait AttachmentSource: Send + Sync {
    /// Opaque identifiers of messages matching the filter, in mailbox order.
    async fn search(&self, filter: &MailFilter) -> Result<Vec<String>>;

    /// Decode the attachments of one message to local files and return their
    /// paths.
    async fn download_attachments(&self, message_id: &str) -> Result<Vec<PathBuf>>;
}

#[derive(Debug, Deserialize)]
struct MessageMeta {
    subject: String,
    sender: String,
}

/// Local maildir-style source: each subdirectory of `root` is one message,
/// holding a `message.json` with subject/sender plus the attachment files.
/// Attachments are "downloaded" by copying them into the temp directory,
/// mirroring how a real provider decodes them to local storage.
pub struct MaildirSource {
    root: PathBuf,
    temp_dir: PathBuf,
}

impl MaildirSource {
    pub fn new(root: impl Into<PathBuf>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            temp_dir: temp_dir.into(),
        }
    }

    async fn read_meta(&self, message_dir: &Path) -> Result<MessageMeta> {
        let raw = tokio::fs::read(message_dir.join("message.json"))
            .await
            .map_err(|e| {
                EtlError::Remote(format!(
                    "Unreadable message at {}: {}",
                    message_dir.display(),
                    e
                ))
            })?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

#[async_trait]
impl AttachmentSource for MaildirSource {
    async fn search(&self, filter: &MailFilter) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(EtlError::Remote(format!("Mailbox listing failed: {e}"))),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| EtlError::Remote(format!("Mailbox listing failed: {e}")))?
        {
            if !entry.path().is_dir() {
                continue;
            }
            let meta = self.read_meta(&entry.path()).await?;
            if meta.subject.contains(&filter.subject) && meta.sender == filter.sender {
                ids.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        ids.sort();
        debug!("Found {} matching messages", ids.len());
        Ok(ids)
    }

    async fn download_attachments(&self, message_id: &str) -> Result<Vec<PathBuf>> {
        let message_dir = self.root.join(message_id);
        tokio::fs::create_dir_all(&self.temp_dir).await?;

        let mut entries = tokio::fs::read_dir(&message_dir)
            .await
            .map_err(|e| EtlError::Remote(format!("No such message '{message_id}': {e}")))?;

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| EtlError::Remote(format!("Attachment listing failed: {e}")))?
        {
            let name = entry.file_name();
            if name.to_string_lossy() == "message.json" || !entry.path().is_file() {
                continue;
            }
            let target = self.temp_dir.join(&name);
            tokio::fs::copy(entry.path(), &target).await?;
            paths.push(target);
        }

        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_message(root: &Path, id: &str, subject: &str, sender: &str, files: &[(&str, &[u8])]) {
        let dir = root.join(id);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("message.json"),
            format!(r#"{{"subject": "{subject}", "sender": "{sender}"}}"#),
        )
        .unwrap();
        for (name, bytes) in files {
            std::fs::write(dir.join(name), bytes).unwrap();
        }
    }

    #[tokio::test]
    async fn search_applies_subject_and_sender_filter() {
        let dir = tempfile::tempdir().unwrap();
        write_message(dir.path(), "m1", "Probando envio", "a@b.com", &[]);
        write_message(dir.path(), "m2", "Probando envio", "other@b.com", &[]);
        write_message(dir.path(), "m3", "Unrelated", "a@b.com", &[]);

        let source = MaildirSource::new(dir.path(), dir.path().join("tmp"));
        let filter = MailFilter {
            subject: "Probando".to_string(),
            sender: "a@b.com".to_string(),
        };
        assert_eq!(source.search(&filter).await.unwrap(), vec!["m1"]);
    }

    #[tokio::test]
    async fn downloads_attachments_to_temp_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_message(
            dir.path(),
            "m1",
            "Probando",
            "a@b.com",
            &[("data.xlsx", b"bytes")],
        );

        let temp = dir.path().join("tmp");
        let source = MaildirSource::new(dir.path(), &temp);
        let paths = source.download_attachments("m1").await.unwrap();
        assert_eq!(paths, vec![temp.join("data.xlsx")]);
        assert_eq!(std::fs::read(&paths[0]).unwrap(), b"bytes");
    }
}
