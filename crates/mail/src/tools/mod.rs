//! Tool adapter layer
//!
//! The three tools an agent can call against the inbox. Inner methods on
//! [`InboxTools`] return `Result<_, ToolError>`; the tool-named methods and
//! [`InboxTools::call`] turn every outcome into text, which is the only thing
//! the agent host ever sees.

mod error;
mod format;
mod inbox;
mod registry;

pub use error::{Action, ToolError};
pub use format::{INBOX_CLEAR, format_digest, format_email, truncate_snippet};
pub use inbox::{EmailContent, InboxTools, MARKED_AS_READ};
pub use registry::{ToolDefinition, GET_UNREAD_MAIL_TOOL, MARK_EMAIL_AS_READ_TOOL, READ_EMAIL_TOOL};

/// Number of unread emails listed when the caller doesn't say
pub const DEFAULT_MAX_RESULTS: i64 = 10;

/// Larger requests are capped to this many emails
pub const MAX_RESULTS_CAP: i64 = 20;

/// Snippets longer than this many characters are cut in digests
pub const SNIPPET_PREVIEW_CHARS: usize = 100;

/// How many recent unread emails an identifier is resolved against
pub const RESOLVE_WINDOW: usize = 20;
