//! Message data models.

use chrono::{DateTime, Utc};

/// A stored message. The retention scanner only reads `id` and `date`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageModel {
    /// Mailbox the message belongs to.
    pub mailbox: String,
    /// Store-assigned identifier, unique within the mailbox.
    pub id: String,
    /// Envelope sender.
    pub from: String,
    /// Subject line.
    pub subject: String,
    /// Delivery time. Retention age is measured from here.
    pub date: DateTime<Utc>,
    /// Size of the raw message in bytes.
    pub size: u64,
}

impl MessageModel {
    /// Creates a message delivered now with a fresh identifier.
    pub fn new(mailbox: impl Into<String>) -> Self {
        Self {
            mailbox: mailbox.into(),
            id: uuid::Uuid::new_v4().simple().to_string(),
            from: String::new(),
            subject: String::new(),
            date: Utc::now(),
            size: 0,
        }
    }

    /// Sets the delivery time.
    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    /// Sets the identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets sender and subject.
    pub fn with_envelope(mut self, from: impl Into<String>, subject: impl Into<String>) -> Self {
        self.from = from.into();
        self.subject = subject.into();
        self
    }
}
