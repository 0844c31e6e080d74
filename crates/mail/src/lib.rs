//! Mail crate - inbox tools for a conversational agent
//!
//! This crate provides:
//! - Domain models (MessageRef, MessageId, BodyNode)
//! - Gmail API client and explicit OAuth authentication context
//! - A provider trait with Gmail and in-memory implementations
//! - Identifier resolution ("2", an email ID, "boss") to one message
//! - The tool adapter layer that turns every outcome into agent-readable text
//!
//! The crate has no UI or agent-runtime dependencies; hosts bind
//! [`InboxTools::definitions`] to their model and route calls to
//! [`InboxTools::call`].

pub mod config;
pub mod gmail;
pub mod models;
pub mod provider;
pub mod resolve;
pub mod tools;

pub use config::{CredentialSource, GmailCredentials};
pub use gmail::{GmailAuth, GmailClient};
pub use models::{BodyNode, MessageId, MessageRef};
pub use provider::{InMemoryMailbox, MailProvider, ProviderCall};
pub use resolve::{MatchKind, Resolved, resolve};
pub use tools::{InboxTools, ToolDefinition, ToolError};
