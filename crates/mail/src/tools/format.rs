//! Text rendering of tool results

use std::fmt::Write;

use super::SNIPPET_PREVIEW_CHARS;
use crate::models::MessageRef;

/// Shown when there are no unread emails
pub const INBOX_CLEAR: &str = "No unread emails found. Your inbox is clear.";

/// Cut a snippet to the preview length, marking the cut with `...`
pub fn truncate_snippet(snippet: &str) -> String {
    match snippet.char_indices().nth(SNIPPET_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &snippet[..cut]),
        None => snippet.to_string(),
    }
}

/// Numbered digest of unread emails
pub fn format_digest(messages: &[MessageRef]) -> String {
    if messages.is_empty() {
        return INBOX_CLEAR.to_string();
    }

    let noun = if messages.len() == 1 { "email" } else { "emails" };
    let mut out = format!("Found {} unread {}:\n", messages.len(), noun);

    for (i, msg) in messages.iter().enumerate() {
        // Writing to a String cannot fail
        let _ = write!(
            out,
            "\n{}. From: {}\n   Subject: {}\n   Preview: {}\n   Email ID: {}\n",
            i + 1,
            msg.sender,
            msg.subject,
            truncate_snippet(&msg.snippet),
            msg.id
        );
    }

    out
}

/// Full view of one email: headers, then the delimited body
pub fn format_email(message: &MessageRef, body: &str) -> String {
    format!(
        "From: {}\nSubject: {}\nDate: {}\nEmail ID: {}\n\n--- CONTENT ---\n{}\n--- END CONTENT ---",
        message.sender,
        message.subject,
        message.date,
        message.id,
        body.trim_end()
    )
}
