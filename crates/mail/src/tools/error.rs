//! Tool-layer error type

use thiserror::Error;

/// Failure of a single tool invocation
#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments rejected before any provider call
    #[error("{0}")]
    InvalidInput(String),

    /// The identifier matched none of the candidate emails
    #[error("no unread email matches '{identifier}'")]
    NotFound { identifier: String },

    /// The provider failed or refused the operation
    #[error(transparent)]
    Provider(#[from] anyhow::Error),
}

impl ToolError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(anyhow::anyhow!(message.into()))
    }

    /// Render as the text handed back to the agent
    pub fn render(&self, action: Action) -> String {
        match self {
            Self::InvalidInput(message) => format!("Error: {}", message),
            Self::NotFound { identifier } => format!(
                "No unread email matches '{}'. Try its position in the unread list (e.g. 1), \
                 a keyword from the sender, or a keyword from the subject.",
                identifier
            ),
            Self::Provider(e) => format!("Error {}: {:#}", action.describe(), e),
        }
    }
}

/// What a tool was doing when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    FetchingEmails,
    ReadingEmail,
    MarkingAsRead,
}

impl Action {
    pub fn describe(self) -> &'static str {
        match self {
            Self::FetchingEmails => "fetching emails",
            Self::ReadingEmail => "reading email",
            Self::MarkingAsRead => "marking email as read",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_render_invalid_input() {
        let err = ToolError::invalid("max_results must be at least 1");
        assert_eq!(
            err.render(Action::FetchingEmails),
            "Error: max_results must be at least 1"
        );
    }

    #[test]
    fn test_render_not_found_contains_identifier() {
        let err = ToolError::NotFound {
            identifier: "dentist".to_string(),
        };
        let text = err.render(Action::ReadingEmail);
        assert!(text.contains("'dentist'"));
        assert!(text.contains("position"));
    }

    #[test]
    fn test_render_provider_error_includes_context_chain() {
        let inner: anyhow::Result<()> = Err(anyhow::anyhow!("connection reset"));
        let err = ToolError::from(inner.context("Failed to send list messages request").unwrap_err());
        assert_eq!(
            err.render(Action::FetchingEmails),
            "Error fetching emails: Failed to send list messages request: connection reset"
        );
    }
}
