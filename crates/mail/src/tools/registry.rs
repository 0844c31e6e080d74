//! Tool definitions and name-based dispatch for agent hosts

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{DEFAULT_MAX_RESULTS, InboxTools, MAX_RESULTS_CAP};

pub const GET_UNREAD_MAIL_TOOL: &str = "get_unread_mail_tool";
pub const READ_EMAIL_TOOL: &str = "read_email_tool";
pub const MARK_EMAIL_AS_READ_TOOL: &str = "mark_email_as_read_tool";

/// A tool an agent can invoke
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Machine-readable tool name
    pub name: String,
    /// What the tool does and when to use it
    pub description: String,
    /// JSON Schema describing the tool's input parameters
    pub parameters: Value,
}

#[derive(Deserialize)]
struct UnreadArgs {
    #[serde(default = "default_max_results")]
    max_results: i64,
}

fn default_max_results() -> i64 {
    DEFAULT_MAX_RESULTS
}

#[derive(Deserialize)]
struct ReadArgs {
    #[serde(default)]
    identifier: String,
}

#[derive(Deserialize)]
struct MarkArgs {
    #[serde(default)]
    message_id: String,
}

impl InboxTools {
    /// Definitions of every tool, for binding to a language model
    pub fn definitions() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: GET_UNREAD_MAIL_TOOL.to_string(),
                description: format!(
                    "Fetch unread emails from the Gmail inbox. Use when the user asks about \
                     unread or new messages or wants to check their inbox. Returns a numbered \
                     list with sender, subject, preview and email ID. At most {} emails are returned.",
                    MAX_RESULTS_CAP
                ),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "max_results": {
                            "type": "integer",
                            "description": "Maximum number of emails to return",
                            "default": DEFAULT_MAX_RESULTS,
                            "minimum": 1
                        }
                    }
                }),
            },
            ToolDefinition {
                name: READ_EMAIL_TOOL.to_string(),
                description: "Read the full content of one unread email. The identifier can be \
                     its position in the unread list (e.g. \"1\"), its email ID, or a keyword \
                     from the sender or subject."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "identifier": {
                            "type": "string",
                            "description": "Position, email ID, or sender/subject keyword"
                        }
                    },
                    "required": ["identifier"]
                }),
            },
            ToolDefinition {
                name: MARK_EMAIL_AS_READ_TOOL.to_string(),
                description: "Mark an email as read by removing its unread status. Use the \
                     email ID shown by the unread listing."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "message_id": {
                            "type": "string",
                            "description": "The Gmail message ID to mark as read"
                        }
                    },
                    "required": ["message_id"]
                }),
            },
        ]
    }

    /// Invoke a tool by name with JSON arguments
    ///
    /// Unknown tools and malformed arguments come back as `Error: ...` text
    /// like every other failure.
    pub fn call(&self, name: &str, args: Value) -> String {
        match name {
            GET_UNREAD_MAIL_TOOL => match parse_args::<UnreadArgs>(name, args) {
                Ok(a) => self.get_unread_mail(a.max_results),
                Err(e) => e,
            },
            READ_EMAIL_TOOL => match parse_args::<ReadArgs>(name, args) {
                Ok(a) => self.read_email(&a.identifier),
                Err(e) => e,
            },
            MARK_EMAIL_AS_READ_TOOL => match parse_args::<MarkArgs>(name, args) {
                Ok(a) => self.mark_email_as_read(&a.message_id),
                Err(e) => e,
            },
            other => format!(
                "Error: unknown tool '{}'. Available tools: {}, {}, {}",
                other, GET_UNREAD_MAIL_TOOL, READ_EMAIL_TOOL, MARK_EMAIL_AS_READ_TOOL
            ),
        }
    }
}

fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T, String> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(|e| format!("Error: invalid arguments for {}: {}", tool, e))
}
