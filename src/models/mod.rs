//! Data models for mailboxes and messages.

mod mailbox;
mod message;

pub use mailbox::*;
pub use message::*;
