//! Command-line argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Inbox assistant -- Gmail tools for a conversational agent
#[derive(Parser)]
#[command(
    name = "inbox-assistant",
    version,
    about = "Gmail inbox tools for a conversational agent",
    long_about = "Exposes the assistant's inbox tools (list unread, read, mark as read) \
                  and invokes them by name, printing exactly the text an agent would receive."
)]
pub struct Cli {
    /// Google OAuth client credentials file (installed-app JSON)
    #[arg(long, global = true)]
    pub credentials: Option<PathBuf>,

    /// Where to store OAuth tokens
    #[arg(long, global = true)]
    pub token_path: Option<PathBuf>,

    /// Use a built-in sample mailbox instead of Gmail
    #[arg(long, global = true)]
    pub demo: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Authenticate with Gmail and store tokens.
    Login,

    /// Delete stored Gmail tokens.
    Logout,

    /// Print the tool definitions as JSON.
    Tools,

    /// Invoke a tool by name.
    Call {
        /// Tool name (e.g. get_unread_mail_tool).
        name: String,

        /// Tool arguments as a JSON object.
        #[arg(long)]
        args: Option<String>,
    },

    /// List unread emails.
    Unread {
        /// Maximum number of emails to list.
        #[arg(long, short, default_value_t = 10, allow_negative_numbers = true)]
        max: i64,
    },

    /// Read an email by position, ID, or sender/subject keyword.
    Read {
        identifier: String,
    },

    /// Mark an email as read.
    MarkRead {
        message_id: String,
    },
}
