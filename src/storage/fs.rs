//! File system mailbox store.
//!
//! Each subdirectory of the base path is a mailbox and each regular file
//! inside it is one message. A message's date is the file's modification
//! time, so the store survives restarts without an index.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::MailboxStore;
use crate::error::{ErrorCode, StorageError, StorageResult};
use crate::models::{MailboxModel, MessageModel};

/// File system implementation of the mailbox store.
pub struct FsMailboxStore {
    /// Base directory holding one subdirectory per mailbox.
    base_path: PathBuf,
}

impl FsMailboxStore {
    pub async fn new(base_path: PathBuf) -> StorageResult<Self> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::with_message(
                ErrorCode::StoreUnavailable,
                format!("Failed to create mailbox directory: {}", e),
            )
        })?;

        Ok(Self { base_path })
    }

    /// Returns the base directory of the store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn mailbox_path(&self, mailbox: &str) -> StorageResult<PathBuf> {
        validate_name(mailbox, ErrorCode::MailboxNotFound)?;
        Ok(self.base_path.join(mailbox))
    }

    fn message_path(&self, mailbox: &str, id: &str) -> StorageResult<PathBuf> {
        validate_name(id, ErrorCode::MessageNotFound)?;
        Ok(self.mailbox_path(mailbox)?.join(id))
    }

    async fn require_mailbox(&self, mailbox: &str) -> StorageResult<PathBuf> {
        let path = self.mailbox_path(mailbox)?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => Ok(path),
            Ok(_) => Err(StorageError::new(ErrorCode::MailboxNotFound)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::new(ErrorCode::MailboxNotFound))
            }
            Err(e) => Err(StorageError::with_message(
                ErrorCode::StoreUnavailable,
                format!("Failed to stat mailbox {}: {}", mailbox, e),
            )),
        }
    }
}

/// Rejects names that would escape the base directory or are hidden.
fn validate_name(name: &str, code: ErrorCode) -> StorageResult<()> {
    if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
        return Err(StorageError::with_message(
            code,
            format!("Invalid name: {:?}", name),
        ));
    }
    Ok(())
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn listing_error(what: &str, e: std::io::Error) -> StorageError {
    StorageError::with_message(
        ErrorCode::StoreUnavailable,
        format!("Failed to list {}: {}", what, e),
    )
}

#[async_trait]
impl MailboxStore for FsMailboxStore {
    async fn create_mailbox(&self, name: &str) -> StorageResult<MailboxModel> {
        let path = self.mailbox_path(name)?;
        match fs::create_dir(&path).await {
            Ok(()) => Ok(MailboxModel::new(name)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(StorageError::new(ErrorCode::MailboxAlreadyExists))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_mailboxes(&self) -> StorageResult<Vec<MailboxModel>> {
        let mut entries = fs::read_dir(&self.base_path)
            .await
            .map_err(|e| listing_error("mailboxes", e))?;

        let mut mailboxes = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| listing_error("mailboxes", e))?
        {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if is_hidden(&name) {
                continue;
            }
            let meta = entry
                .metadata()
                .await
                .map_err(|e| listing_error("mailboxes", e))?;
            if !meta.is_dir() {
                continue;
            }
            let created = meta
                .created()
                .or_else(|_| meta.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            mailboxes.push(MailboxModel { name, created });
        }

        mailboxes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(mailboxes)
    }

    async fn list_messages(&self, mailbox: &str) -> StorageResult<Vec<MessageModel>> {
        let path = self.require_mailbox(mailbox).await?;
        let what = format!("messages in {}", mailbox);

        let mut entries = fs::read_dir(&path)
            .await
            .map_err(|e| listing_error(&what, e))?;

        let mut messages = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| listing_error(&what, e))?
        {
            let Ok(id) = entry.file_name().into_string() else {
                continue;
            };
            if is_hidden(&id) {
                continue;
            }
            let meta = entry
                .metadata()
                .await
                .map_err(|e| listing_error(&what, e))?;
            if !meta.is_file() {
                continue;
            }
            let date = meta.modified().map_err(|e| listing_error(&what, e))?;
            messages.push(MessageModel {
                mailbox: mailbox.to_string(),
                id,
                from: String::new(),
                subject: String::new(),
                date: DateTime::<Utc>::from(date),
                size: meta.len(),
            });
        }

        messages.sort_by(|a, b| (a.date, &a.id).cmp(&(b.date, &b.id)));
        Ok(messages)
    }

    async fn deliver(&self, message: MessageModel) -> StorageResult<()> {
        let mailbox_path = self.mailbox_path(&message.mailbox)?;
        fs::create_dir_all(&mailbox_path).await?;

        let path = self.message_path(&message.mailbox, &message.id)?;
        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::with_message(
                ErrorCode::InternalError,
                format!("Failed to create message file: {}", e),
            )
        })?;

        let body = format!("From: {}\r\nSubject: {}\r\n\r\n", message.from, message.subject);
        file.write_all(body.as_bytes()).await.map_err(|e| {
            StorageError::with_message(
                ErrorCode::InternalError,
                format!("Failed to write message data: {}", e),
            )
        })?;
        file.flush().await?;
        drop(file);

        // The modification time carries the delivery date
        let modified: SystemTime = message.date.into();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let file = std::fs::OpenOptions::new().write(true).open(&path)?;
            file.set_modified(modified)
        })
        .await
        .map_err(|e| StorageError::with_message(ErrorCode::InternalError, e.to_string()))??;

        Ok(())
    }

    async fn delete_message(&self, mailbox: &str, id: &str) -> StorageResult<()> {
        self.require_mailbox(mailbox).await?;
        let path = self.message_path(mailbox, id)?;
        fs::remove_file(&path).await.map_err(StorageError::from)
    }

    async fn message_count(&self) -> StorageResult<usize> {
        let mut total = 0;
        for mailbox in self.list_mailboxes().await? {
            total += self.list_messages(&mailbox.name).await?.len();
        }
        Ok(total)
    }
}
