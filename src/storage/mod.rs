//! Mailbox storage backends.

mod fs;
mod mailbox;

pub use fs::*;
pub use mailbox::*;
