//! Mailbox store trait and in-memory implementation.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{ErrorCode, StorageError, StorageResult};
use crate::models::{MailboxModel, MessageModel};

/// Trait for mailbox storage operations.
#[async_trait]
pub trait MailboxStore: Send + Sync {
    // Mailbox operations
    async fn create_mailbox(&self, name: &str) -> StorageResult<MailboxModel>;
    async fn list_mailboxes(&self) -> StorageResult<Vec<MailboxModel>>;

    // Message operations
    async fn list_messages(&self, mailbox: &str) -> StorageResult<Vec<MessageModel>>;
    async fn deliver(&self, message: MessageModel) -> StorageResult<()>;
    async fn delete_message(&self, mailbox: &str, id: &str) -> StorageResult<()>;
    async fn message_count(&self) -> StorageResult<usize>;
}

/// Key type for messages - uses Arc<str> to avoid allocations.
type MessageKey = (Arc<str>, Arc<str>);

/// In-memory implementation of the mailbox store.
pub struct MemoryMailboxStore {
    /// Mailboxes indexed by name.
    mailboxes: DashMap<Arc<str>, MailboxModel>,

    /// Messages indexed by (mailbox, id).
    messages: DashMap<MessageKey, MessageModel>,

    /// Secondary index: mailbox -> set of message ids (for faster listing).
    message_index: DashMap<Arc<str>, HashSet<Arc<str>>>,
}

impl MemoryMailboxStore {
    pub fn new() -> Self {
        Self {
            mailboxes: DashMap::new(),
            messages: DashMap::new(),
            message_index: DashMap::new(),
        }
    }

    #[inline]
    fn arc_str(s: &str) -> Arc<str> {
        Arc::from(s)
    }

    #[inline]
    fn message_key(mailbox: &str, id: &str) -> MessageKey {
        (Self::arc_str(mailbox), Self::arc_str(id))
    }
}

impl Default for MemoryMailboxStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MailboxStore for MemoryMailboxStore {
    async fn create_mailbox(&self, name: &str) -> StorageResult<MailboxModel> {
        let key = Self::arc_str(name);
        if self.mailboxes.contains_key(&key) {
            return Err(StorageError::new(ErrorCode::MailboxAlreadyExists));
        }
        let mailbox = MailboxModel::new(name);
        self.mailboxes.insert(key, mailbox.clone());
        Ok(mailbox)
    }

    async fn list_mailboxes(&self) -> StorageResult<Vec<MailboxModel>> {
        let mut mailboxes: Vec<MailboxModel> = self
            .mailboxes
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        mailboxes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(mailboxes)
    }

    async fn list_messages(&self, mailbox: &str) -> StorageResult<Vec<MessageModel>> {
        if !self.mailboxes.contains_key(mailbox) {
            return Err(StorageError::new(ErrorCode::MailboxNotFound));
        }

        // Copy the ids out first so no index guard is held while reading messages
        let ids: Vec<Arc<str>> = self
            .message_index
            .get(mailbox)
            .map(|entry| entry.iter().cloned().collect())
            .unwrap_or_default();

        let mailbox_arc = Self::arc_str(mailbox);
        let mut messages = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(entry) = self.messages.get(&(mailbox_arc.clone(), id)) {
                messages.push(entry.value().clone());
            }
        }

        messages.sort_by(|a, b| (a.date, &a.id).cmp(&(b.date, &b.id)));
        Ok(messages)
    }

    async fn deliver(&self, message: MessageModel) -> StorageResult<()> {
        let mailbox = Self::arc_str(&message.mailbox);
        let id = Self::arc_str(&message.id);

        self.mailboxes
            .entry(mailbox.clone())
            .or_insert_with(|| MailboxModel::new(message.mailbox.clone()));

        self.message_index
            .entry(mailbox.clone())
            .or_default()
            .insert(id.clone());

        self.messages.insert((mailbox, id), message);
        Ok(())
    }

    async fn delete_message(&self, mailbox: &str, id: &str) -> StorageResult<()> {
        if !self.mailboxes.contains_key(mailbox) {
            return Err(StorageError::new(ErrorCode::MailboxNotFound));
        }

        let removed = self.messages.remove(&Self::message_key(mailbox, id));

        if let Some(mut entry) = self.message_index.get_mut(mailbox) {
            entry.remove(id);
        }

        removed
            .map(|_| ())
            .ok_or_else(|| StorageError::new(ErrorCode::MessageNotFound))
    }

    async fn message_count(&self) -> StorageResult<usize> {
        Ok(self.messages.len())
    }
}
