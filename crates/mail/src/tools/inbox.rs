//! Inbox tools over a mail provider

use log::{debug, info};
use std::sync::Arc;

use super::format::{format_digest, format_email};
use super::{Action, MAX_RESULTS_CAP, RESOLVE_WINDOW, ToolError};
use crate::models::{MessageId, MessageRef};
use crate::provider::MailProvider;
use crate::resolve::resolve;

/// Shown after a successful mark-as-read
pub const MARKED_AS_READ: &str = "Email has been marked as read.";

/// A resolved email together with its decoded body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub message: MessageRef,
    pub body: String,
}

/// The assistant's inbox tools
///
/// Holds no state of its own between calls; every invocation goes straight
/// to the provider.
pub struct InboxTools {
    provider: Arc<dyn MailProvider>,
}

impl InboxTools {
    pub fn new(provider: Arc<dyn MailProvider>) -> Self {
        Self { provider }
    }

    // === Tool entry points (always text) ===

    /// `get_unread_mail_tool`: digest of unread emails
    pub fn get_unread_mail(&self, max_results: i64) -> String {
        match self.list_unread(max_results) {
            Ok(messages) => format_digest(&messages),
            Err(e) => e.render(Action::FetchingEmails),
        }
    }

    /// `read_email_tool`: full content of the email `identifier` points at
    pub fn read_email(&self, identifier: &str) -> String {
        match self.read(identifier) {
            Ok(content) => format_email(&content.message, &content.body),
            Err(e) => e.render(Action::ReadingEmail),
        }
    }

    /// `mark_email_as_read_tool`: clear the unread flag on a message
    pub fn mark_email_as_read(&self, message_id: &str) -> String {
        match self.mark_read(message_id) {
            Ok(()) => MARKED_AS_READ.to_string(),
            Err(e) => e.render(Action::MarkingAsRead),
        }
    }

    // === Typed operations ===

    /// List unread emails, capping `max_results` at [`MAX_RESULTS_CAP`]
    pub fn list_unread(&self, max_results: i64) -> Result<Vec<MessageRef>, ToolError> {
        if max_results < 1 {
            return Err(ToolError::invalid("max_results must be at least 1"));
        }

        let limit = if max_results > MAX_RESULTS_CAP {
            info!("Limiting to {} emails (requested {})", MAX_RESULTS_CAP, max_results);
            MAX_RESULTS_CAP
        } else {
            max_results
        };

        // limit is within 1..=MAX_RESULTS_CAP here
        let messages = self.provider.list_unread(limit as usize)?;
        debug!("Fetched {} unread email(s)", messages.len());
        Ok(messages)
    }

    /// Resolve `identifier` against recent unread mail and fetch its body
    ///
    /// The identifier is matched as given; surrounding whitespace only matters
    /// for the emptiness check and the position parse.
    pub fn read(&self, identifier: &str) -> Result<EmailContent, ToolError> {
        if identifier.trim().is_empty() {
            return Err(ToolError::invalid("identifier must be provided"));
        }

        let candidates = self.provider.list_unread(RESOLVE_WINDOW)?;
        let resolved = resolve(identifier, &candidates).ok_or_else(|| ToolError::NotFound {
            identifier: identifier.to_string(),
        })?;
        debug!(
            "Resolved '{}' to email {} via {:?}",
            identifier, resolved.message.id, resolved.kind
        );

        let message = resolved.message.clone();
        let body = self.provider.get_body(&message.id)?;
        if body.trim().is_empty() {
            return Err(ToolError::provider(format!(
                "couldn't retrieve body of email ID: {}",
                message.id
            )));
        }

        Ok(EmailContent { message, body })
    }

    /// Remove the UNREAD label from `message_id`
    pub fn mark_read(&self, message_id: &str) -> Result<(), ToolError> {
        let message_id = message_id.trim();
        if message_id.is_empty() {
            return Err(ToolError::invalid("message_id must be provided"));
        }

        let id = MessageId::new(message_id);
        if self.provider.set_read_state(&id, false)? {
            Ok(())
        } else {
            Err(ToolError::provider(format!(
                "the mail provider did not apply the change to email ID: {}",
                id
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{InMemoryMailbox, ProviderCall};

    fn setup(mailbox: InMemoryMailbox) -> (Arc<InMemoryMailbox>, InboxTools) {
        let mailbox = Arc::new(mailbox);
        let tools = InboxTools::new(mailbox.clone());
        (mailbox, tools)
    }

    fn two_messages() -> InMemoryMailbox {
        InMemoryMailbox::new()
            .with_message(
                MessageRef::builder("a")
                    .sender("news@example.com")
                    .subject("Weekly digest")
                    .snippet("This week"),
                "digest body",
            )
            .with_message(
                MessageRef::builder("b")
                    .sender("myboss@example.com")
                    .subject("Status update")
                    .snippet("Need the numbers"),
                "please send the numbers",
            )
    }

    #[test]
    fn test_list_rejects_non_positive_without_calling_provider() {
        let (mailbox, tools) = setup(two_messages());
        for n in [0, -1, -100] {
            assert!(matches!(
                tools.list_unread(n),
                Err(ToolError::InvalidInput(_))
            ));
            assert_eq!(
                tools.get_unread_mail(n),
                "Error: max_results must be at least 1"
            );
        }
        assert!(mailbox.calls().is_empty());
    }

    #[test]
    fn test_list_caps_at_twenty() {
        let (mailbox, tools) = setup(two_messages());
        tools.list_unread(21).unwrap();
        tools.list_unread(1000).unwrap();
        tools.list_unread(5).unwrap();
        assert_eq!(
            mailbox.calls(),
            vec![
                ProviderCall::ListUnread { limit: 20 },
                ProviderCall::ListUnread { limit: 20 },
                ProviderCall::ListUnread { limit: 5 },
            ]
        );
    }

    #[test]
    fn test_read_by_position() {
        let (mailbox, tools) = setup(two_messages());
        let content = tools.read("2").unwrap();
        assert_eq!(content.message.id.as_str(), "b");
        assert_eq!(content.body, "please send the numbers");
        assert_eq!(
            mailbox.calls(),
            vec![
                ProviderCall::ListUnread {
                    limit: RESOLVE_WINDOW
                },
                ProviderCall::GetBody {
                    id: MessageId::new("b")
                },
            ]
        );
    }

    #[test]
    fn test_read_by_sender_keyword() {
        let (_, tools) = setup(two_messages());
        let text = tools.read_email("BOSS");
        assert!(text.starts_with("From: myboss@example.com\n"));
        assert!(text.contains("Email ID: b\n"));
        assert!(text.contains("--- CONTENT ---\nplease send the numbers\n--- END CONTENT ---"));
    }

    #[test]
    fn test_read_not_found_mentions_identifier() {
        let (mailbox, tools) = setup(two_messages());
        let text = tools.read_email("dentist");
        assert!(text.contains("'dentist'"));
        // Only the candidate listing happened
        assert_eq!(mailbox.calls().len(), 1);
    }

    #[test]
    fn test_read_not_found_keeps_identifier_verbatim() {
        let (_, tools) = setup(two_messages());
        let text = tools.read_email(" dentist ");
        assert!(text.contains("' dentist '"));
        assert!(matches!(
            tools.read(" dentist "),
            Err(ToolError::NotFound { identifier }) if identifier == " dentist "
        ));
    }

    #[test]
    fn test_read_exact_id_is_not_trimmed() {
        let mailbox = InMemoryMailbox::new()
            .with_message(MessageRef::builder("x1").sender("a@example.com"), "body x1")
            .with_message(MessageRef::builder(" x1").sender("b@example.com"), "body spaced");
        let (_, tools) = setup(mailbox);
        assert_eq!(tools.read(" x1").unwrap().body, "body spaced");
        assert_eq!(tools.read("x1").unwrap().body, "body x1");
    }

    #[test]
    fn test_read_empty_identifier() {
        let (mailbox, tools) = setup(two_messages());
        assert_eq!(tools.read_email("   "), "Error: identifier must be provided");
        assert!(mailbox.calls().is_empty());
    }

    #[test]
    fn test_read_empty_body_is_provider_failure() {
        let mailbox = InMemoryMailbox::new().with_message(MessageRef::builder("e1"), "");
        let (_, tools) = setup(mailbox);
        assert_eq!(
            tools.read_email("1"),
            "Error reading email: couldn't retrieve body of email ID: e1"
        );
    }

    #[test]
    fn test_mark_read() {
        let (mailbox, tools) = setup(two_messages());
        assert_eq!(tools.mark_email_as_read("a"), MARKED_AS_READ);
        assert_eq!(mailbox.is_unread(&MessageId::new("a")), Some(false));
    }

    #[test]
    fn test_mark_read_rejected() {
        let (mailbox, tools) = setup(two_messages());
        mailbox.reject_mutations(true);
        let text = tools.mark_email_as_read("a");
        assert!(text.starts_with("Error marking email as read: "));
        assert_ne!(text, MARKED_AS_READ);
    }

    #[test]
    fn test_mark_read_empty_id() {
        let (mailbox, tools) = setup(two_messages());
        assert_eq!(tools.mark_email_as_read(""), "Error: message_id must be provided");
        assert!(mailbox.calls().is_empty());
    }

    #[test]
    fn test_provider_failures_become_prefixed_text() {
        let (mailbox, tools) = setup(two_messages());
        mailbox.fail_with("backend unavailable");
        assert_eq!(
            tools.get_unread_mail(10),
            "Error fetching emails: backend unavailable"
        );
        assert_eq!(
            tools.read_email("1"),
            "Error reading email: backend unavailable"
        );
        assert_eq!(
            tools.mark_email_as_read("a"),
            "Error marking email as read: backend unavailable"
        );
    }
}
