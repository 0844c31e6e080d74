//! Gmail API integration
//!
//! This module provides:
//! - An explicit OAuth2 authentication context
//! - A Gmail API client implementing [`MailProvider`](crate::provider::MailProvider)
//! - Response normalization to domain models

mod auth;
mod client;
mod normalize;

pub use auth::{GmailAuth, DEFAULT_SCOPES};
pub use client::GmailClient;
pub use normalize::normalize_message_ref;

/// Gmail API request and response types
pub mod api {
    use serde::{Deserialize, Serialize};

    /// Response from listing messages
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ListMessagesResponse {
        pub messages: Option<Vec<MessageStub>>,
    }

    /// Reference to a message as returned by list calls
    #[derive(Debug, Deserialize)]
    pub struct MessageStub {
        pub id: String,
    }

    /// Message from Gmail API (`format=full` or `format=metadata`)
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GmailMessage {
        pub id: String,
        pub label_ids: Option<Vec<String>>,
        #[serde(default)]
        pub snippet: String,
        pub payload: Option<MessagePayload>,
    }

    /// Message payload containing headers and body
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessagePayload {
        pub headers: Option<Vec<Header>>,
        pub body: Option<MessageBody>,
        pub parts: Option<Vec<MessagePart>>,
        pub mime_type: Option<String>,
    }

    /// Email header (name-value pair)
    #[derive(Debug, Deserialize)]
    pub struct Header {
        pub name: String,
        pub value: String,
    }

    /// Message body (may be base64 encoded)
    #[derive(Debug, Deserialize)]
    pub struct MessageBody {
        pub data: Option<String>,
    }

    /// Message part (for multipart messages)
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessagePart {
        pub mime_type: Option<String>,
        pub body: Option<MessageBody>,
        pub parts: Option<Vec<MessagePart>>,
    }

    /// Body of `users.messages.modify`
    #[derive(Debug, Default, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ModifyMessageRequest {
        #[serde(skip_serializing_if = "Vec::is_empty")]
        pub add_label_ids: Vec<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        pub remove_label_ids: Vec<String>,
    }
}
