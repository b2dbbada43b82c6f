//! Mailbox data models.

use chrono::{DateTime, Utc};

/// A named group of messages held by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxModel {
    /// Mailbox name.
    pub name: String,
    /// When the mailbox was first seen by the store.
    pub created: DateTime<Utc>,
}

impl MailboxModel {
    /// Creates a new mailbox model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created: Utc::now(),
        }
    }
}
