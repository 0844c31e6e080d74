//! Gmail API response normalization
//!
//! Converts Gmail API responses to domain models.

use anyhow::{Context, Result};

use super::api::{GmailMessage, MessagePayload};
use crate::models::{labels, MessageRef};

/// Normalize a Gmail API message into a [`MessageRef`]
///
/// Missing headers fall back to `Unknown` / `No Subject`. The snippet has
/// HTML entities decoded since Gmail escapes it.
pub fn normalize_message_ref(gmail_msg: GmailMessage) -> Result<MessageRef> {
    let payload = gmail_msg
        .payload
        .as_ref()
        .context("Message has no payload")?;

    let is_unread = gmail_msg
        .label_ids
        .as_ref()
        .is_some_and(|ids| ids.iter().any(|l| l == labels::UNREAD));

    let mut builder = MessageRef::builder(gmail_msg.id.as_str())
        .snippet(decode_html_entities(&gmail_msg.snippet))
        .unread(is_unread);

    if let Some(subject) = extract_header(payload, "Subject") {
        builder = builder.subject(subject);
    }
    if let Some(sender) = extract_header(payload, "From") {
        builder = builder.sender(sender);
    }
    if let Some(date) = extract_header(payload, "Date") {
        builder = builder.date(date);
    }

    Ok(builder.build())
}

/// Extract a header value by name
fn extract_header(payload: &MessagePayload, name: &str) -> Option<String> {
    payload.headers.as_ref()?.iter().find_map(|h| {
        if h.name.eq_ignore_ascii_case(name) {
            Some(h.value.clone())
        } else {
            None
        }
    })
}

/// Decode HTML entities in snippet text
fn decode_html_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
