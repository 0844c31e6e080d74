//! Mail provider abstraction
//!
//! The tool layer only ever talks to a [`MailProvider`]. Gmail is the real
//! implementation; [`InMemoryMailbox`] backs tests and demo runs.

mod memory;

use anyhow::Result;

use crate::models::{MessageId, MessageRef};

pub use memory::{InMemoryMailbox, ProviderCall};

/// Operations the assistant needs from a mailbox
///
/// Every call stands alone: implementations may re-authenticate and re-fetch
/// on each invocation, and nothing here coordinates concurrent callers.
pub trait MailProvider: Send + Sync {
    /// List up to `limit` unread messages in the inbox, newest first
    fn list_unread(&self, limit: usize) -> Result<Vec<MessageRef>>;

    /// Get the decoded plain-text body of a message (empty if it has none)
    fn get_body(&self, id: &MessageId) -> Result<String>;

    /// Add (`unread = true`) or remove the UNREAD label.
    ///
    /// Returns whether the provider applied the change.
    fn set_read_state(&self, id: &MessageId, unread: bool) -> Result<bool>;

    /// List up to `limit` messages whose sender matches `sender_query`
    fn search_by_sender(&self, sender_query: &str, limit: usize) -> Result<Vec<MessageRef>>;
}
