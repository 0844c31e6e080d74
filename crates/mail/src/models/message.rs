//! Message model as seen by the tool layer

use serde::{Deserialize, Serialize};

/// Unique identifier for a message (Gmail message ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Summary of one message returned by listing calls
///
/// Built once by the provider and never mutated afterwards. Header values are
/// kept verbatim (e.g. `sender` is the raw `From` header).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    /// Gmail message ID
    pub id: MessageId,
    /// Subject line
    pub subject: String,
    /// Raw `From` header (e.g. "Jane Boss <boss@example.com>")
    pub sender: String,
    /// Raw `Date` header
    pub date: String,
    /// Provider-supplied preview text
    pub snippet: String,
    /// Whether the message still carries the UNREAD label
    pub is_unread: bool,
}

impl MessageRef {
    /// Start building a message reference
    pub fn builder(id: impl Into<MessageId>) -> MessageRefBuilder {
        MessageRefBuilder::new(id.into())
    }
}

/// Builder for creating MessageRef instances
pub struct MessageRefBuilder {
    id: MessageId,
    subject: Option<String>,
    sender: Option<String>,
    date: Option<String>,
    snippet: String,
    is_unread: bool,
}

impl MessageRefBuilder {
    fn new(id: MessageId) -> Self {
        Self {
            id,
            subject: None,
            sender: None,
            date: None,
            snippet: String::new(),
            is_unread: true,
        }
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    pub fn unread(mut self, is_unread: bool) -> Self {
        self.is_unread = is_unread;
        self
    }

    pub fn build(self) -> MessageRef {
        MessageRef {
            id: self.id,
            subject: self.subject.unwrap_or_else(|| "No Subject".to_string()),
            sender: self.sender.unwrap_or_else(|| "Unknown".to_string()),
            date: self.date.unwrap_or_else(|| "Unknown".to_string()),
            snippet: self.snippet,
            is_unread: self.is_unread,
        }
    }
}

impl From<MessageRefBuilder> for MessageRef {
    fn from(builder: MessageRefBuilder) -> Self {
        builder.build()
    }
}
