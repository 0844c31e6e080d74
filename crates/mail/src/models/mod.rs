//! Domain models for mail entities

mod body;
mod message;

pub use body::BodyNode;
pub use message::{MessageId, MessageRef, MessageRefBuilder};

/// Label IDs used by Gmail for common states
pub mod labels {
    pub const INBOX: &str = "INBOX";
    pub const UNREAD: &str = "UNREAD";
}
