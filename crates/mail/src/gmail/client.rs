//! Gmail API HTTP client
//!
//! Provides the mailbox operations the tool layer needs on top of the Gmail
//! REST API. Uses synchronous HTTP (ureq) to be executor-agnostic.

use anyhow::{Context, Result};
use log::{debug, info, warn};

use super::api::{GmailMessage, ListMessagesResponse, ModifyMessageRequest};
use super::{GmailAuth, normalize_message_ref};
use crate::models::{BodyNode, MessageId, MessageRef, labels};
use crate::provider::MailProvider;

/// Gmail API client
pub struct GmailClient {
    auth: GmailAuth,
    base_url: String,
}

/// Representation requested from `users.messages.get`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MessageFormat {
    /// Headers and snippet only
    Metadata,
    /// Full MIME payload including body data
    Full,
}

impl GmailClient {
    /// Gmail API base URL
    pub const BASE_URL: &'static str = "https://gmail.googleapis.com/gmail/v1";

    /// Create a new Gmail client around an authentication context
    pub fn new(auth: GmailAuth) -> Self {
        Self {
            auth,
            base_url: Self::BASE_URL.to_string(),
        }
    }

    /// Point the client at a different API root (e.g. a proxy)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// List message IDs filtered by labels and/or a search query
    ///
    /// # Arguments
    /// * `label_ids` - Labels every returned message must carry
    /// * `query` - Optional Gmail search query (e.g. `from:alice`)
    /// * `max_results` - Maximum number of messages to return (1-500)
    pub fn list_messages(
        &self,
        label_ids: &[&str],
        query: Option<&str>,
        max_results: usize,
    ) -> Result<ListMessagesResponse> {
        let access_token = self.auth.access_token()?;
        let url = list_messages_url(&self.base_url, label_ids, query, max_results);
        debug!("GET {}", url);

        let mut response = ureq::get(&url)
            .header("Authorization", &format!("Bearer {}", access_token))
            .call()
            .context("Failed to send list messages request")?;

        let list: ListMessagesResponse = response
            .body_mut()
            .read_json()
            .context("Failed to parse list messages response")?;

        Ok(list)
    }

    /// Get a message by ID in the requested representation
    fn get_message(&self, id: &MessageId, format: MessageFormat) -> Result<GmailMessage> {
        let access_token = self.auth.access_token()?;
        let url = get_message_url(&self.base_url, id, format);
        debug!("GET {}", url);

        let mut response = ureq::get(&url)
            .header("Authorization", &format!("Bearer {}", access_token))
            .call()
            .with_context(|| format!("Failed to send get message request for {}", id))?;

        let message: GmailMessage = response
            .body_mut()
            .read_json()
            .context("Failed to parse message response")?;

        Ok(message)
    }

    /// Fetch metadata for each listed message and normalize it
    fn list_refs(&self, label_ids: &[&str], query: Option<&str>, limit: usize) -> Result<Vec<MessageRef>> {
        let listed = self.list_messages(label_ids, query, limit)?;
        let stubs = listed.messages.unwrap_or_default();
        debug!("Listed {} message(s)", stubs.len());

        stubs
            .into_iter()
            .take(limit)
            .map(|stub| {
                let id = MessageId::new(stub.id);
                let msg = self.get_message(&id, MessageFormat::Metadata)?;
                normalize_message_ref(msg)
            })
            .collect()
    }

    /// Add and remove labels on a single message
    ///
    /// Returns `Ok(false)` when Gmail rejects the change with an HTTP status,
    /// and `Err` when the request could not be made at all.
    pub fn modify_labels(&self, id: &MessageId, add: &[&str], remove: &[&str]) -> Result<bool> {
        let access_token = self.auth.access_token()?;
        let url = format!("{}/users/me/messages/{}/modify", self.base_url, encode_id(id));
        let request = ModifyMessageRequest {
            add_label_ids: add.iter().map(|s| s.to_string()).collect(),
            remove_label_ids: remove.iter().map(|s| s.to_string()).collect(),
        };
        debug!("POST {}", url);

        let result = ureq::post(&url)
            .header("Authorization", &format!("Bearer {}", access_token))
            .send_json(&request);

        match result {
            Ok(_) => Ok(true),
            Err(ureq::Error::StatusCode(status)) => {
                warn!("Gmail rejected label change on {} (HTTP {})", id, status);
                Ok(false)
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to send modify request")),
        }
    }
}

impl MailProvider for GmailClient {
    fn list_unread(&self, limit: usize) -> Result<Vec<MessageRef>> {
        self.list_refs(&[labels::INBOX, labels::UNREAD], None, limit)
    }

    fn get_body(&self, id: &MessageId) -> Result<String> {
        let msg = self.get_message(id, MessageFormat::Full)?;
        let payload = msg.payload.as_ref().context("Message has no payload")?;
        Ok(BodyNode::from_payload(payload).plain_text())
    }

    fn set_read_state(&self, id: &MessageId, unread: bool) -> Result<bool> {
        let applied = if unread {
            self.modify_labels(id, &[labels::UNREAD], &[])?
        } else {
            self.modify_labels(id, &[], &[labels::UNREAD])?
        };

        if applied {
            info!("Marked email {} as {}", id, if unread { "unread" } else { "read" });
        }
        Ok(applied)
    }

    fn search_by_sender(&self, sender_query: &str, limit: usize) -> Result<Vec<MessageRef>> {
        let query = format!("from:{}", sender_query);
        self.list_refs(&[], Some(&query), limit)
    }
}

fn encode_id(id: &MessageId) -> String {
    urlencoding::encode(id.as_str()).into_owned()
}

/// Build the `users.messages.list` URL
fn list_messages_url(
    base_url: &str,
    label_ids: &[&str],
    query: Option<&str>,
    max_results: usize,
) -> String {
    let mut url = format!(
        "{}/users/me/messages?maxResults={}",
        base_url,
        max_results.clamp(1, 500)
    );

    for label in label_ids {
        url.push_str(&format!("&labelIds={}", urlencoding::encode(label)));
    }

    if let Some(q) = query {
        url.push_str(&format!("&q={}", urlencoding::encode(q)));
    }

    url
}

/// Build the `users.messages.get` URL
fn get_message_url(base_url: &str, id: &MessageId, format: MessageFormat) -> String {
    let mut url = format!("{}/users/me/messages/{}", base_url, encode_id(id));
    match format {
        MessageFormat::Full => url.push_str("?format=full"),
        MessageFormat::Metadata => url.push_str(
            "?format=metadata&metadataHeaders=From&metadataHeaders=Subject&metadataHeaders=Date",
        ),
    }
    url
}
