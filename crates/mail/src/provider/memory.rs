//! In-memory mailbox
//!
//! A [`MailProvider`] over a fixed list of messages. Every call is recorded so
//! tests can assert what reached the provider, and failures can be injected.

use anyhow::{Result, anyhow};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::MailProvider;
use crate::models::{MessageId, MessageRef};

/// A call that reached the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    ListUnread { limit: usize },
    GetBody { id: MessageId },
    SetReadState { id: MessageId, unread: bool },
    SearchBySender { query: String, limit: usize },
}

struct StoredMail {
    summary: MessageRef,
    body: String,
}

/// In-memory implementation of MailProvider
///
/// Messages keep insertion order, which is the order listings return them in.
pub struct InMemoryMailbox {
    mail: RwLock<Vec<StoredMail>>,
    calls: RwLock<Vec<ProviderCall>>,
    failure: RwLock<Option<String>>,
    reject_mutations: RwLock<bool>,
}

impl Default for InMemoryMailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMailbox {
    /// Create an empty mailbox
    pub fn new() -> Self {
        Self {
            mail: RwLock::new(Vec::new()),
            calls: RwLock::new(Vec::new()),
            failure: RwLock::new(None),
            reject_mutations: RwLock::new(false),
        }
    }

    /// Add a message with its plain-text body (builder style)
    pub fn with_message(self, summary: impl Into<MessageRef>, body: impl Into<String>) -> Self {
        self.insert(summary, body);
        self
    }

    /// Add a message with its plain-text body
    pub fn insert(&self, summary: impl Into<MessageRef>, body: impl Into<String>) {
        write(&self.mail).push(StoredMail {
            summary: summary.into(),
            body: body.into(),
        });
    }

    /// A small mailbox with realistic unread mail, for demo runs
    pub fn sample() -> Self {
        Self::new()
            .with_message(
                MessageRef::builder("18c2a1f0e4b7d001")
                    .sender("Dana Whitfield <dana@northwind.example>")
                    .subject("Q3 budget review moved to Thursday")
                    .date("Mon, 14 Oct 2024 08:12:44 -0400")
                    .snippet("Hi all, the budget review is now Thursday at 10am. Please bring updated forecasts for your teams and flag anything over plan."),
                "Hi all,\n\nThe budget review is now Thursday at 10am in the large conference room.\nPlease bring updated forecasts for your teams and flag anything over plan.\n\nThanks,\nDana",
            )
            .with_message(
                MessageRef::builder("18c2a1f0e4b7d002")
                    .sender("GitHub <noreply@github.com>")
                    .subject("[inbox-assistant] CI failed on main")
                    .date("Mon, 14 Oct 2024 09:30:02 +0000")
                    .snippet("The workflow run for commit 3f2c9a1 failed."),
                "The workflow run for commit 3f2c9a1 failed.\n\nJob: test (ubuntu-latest)\n",
            )
            .with_message(
                MessageRef::builder("18c2a1f0e4b7d003")
                    .sender("Sam Ortiz <sam.ortiz@example.org>")
                    .subject("Lunch on Friday?")
                    .date("Mon, 14 Oct 2024 11:05:19 -0700")
                    .snippet("Are you free for lunch on Friday? There's a new ramen place near the office."),
                "Are you free for lunch on Friday? There's a new ramen place near the office.\n\n- Sam",
            )
    }

    /// Make every subsequent call fail with `message`
    pub fn fail_with(&self, message: impl Into<String>) {
        *write(&self.failure) = Some(message.into());
    }

    /// Make label changes report "not applied" instead of succeeding
    pub fn reject_mutations(&self, reject: bool) {
        *write(&self.reject_mutations) = reject;
    }

    /// Calls received so far, in order
    pub fn calls(&self) -> Vec<ProviderCall> {
        read(&self.calls).clone()
    }

    /// Whether the message with `id` is currently unread
    pub fn is_unread(&self, id: &MessageId) -> Option<bool> {
        read(&self.mail)
            .iter()
            .find(|m| &m.summary.id == id)
            .map(|m| m.summary.is_unread)
    }

    fn record(&self, call: ProviderCall) -> Result<()> {
        write(&self.calls).push(call);
        match read(&self.failure).as_ref() {
            Some(message) => Err(anyhow!("{}", message)),
            None => Ok(()),
        }
    }
}

impl MailProvider for InMemoryMailbox {
    fn list_unread(&self, limit: usize) -> Result<Vec<MessageRef>> {
        self.record(ProviderCall::ListUnread { limit })?;
        Ok(read(&self.mail)
            .iter()
            .filter(|m| m.summary.is_unread)
            .take(limit)
            .map(|m| m.summary.clone())
            .collect())
    }

    fn get_body(&self, id: &MessageId) -> Result<String> {
        self.record(ProviderCall::GetBody { id: id.clone() })?;
        read(&self.mail)
            .iter()
            .find(|m| &m.summary.id == id)
            .map(|m| m.body.clone())
            .ok_or_else(|| anyhow!("Requested entity was not found: {}", id))
    }

    fn set_read_state(&self, id: &MessageId, unread: bool) -> Result<bool> {
        self.record(ProviderCall::SetReadState {
            id: id.clone(),
            unread,
        })?;

        if *read(&self.reject_mutations) {
            return Ok(false);
        }

        let mut mail = write(&self.mail);
        match mail.iter_mut().find(|m| &m.summary.id == id) {
            Some(stored) => {
                stored.summary.is_unread = unread;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn search_by_sender(&self, sender_query: &str, limit: usize) -> Result<Vec<MessageRef>> {
        self.record(ProviderCall::SearchBySender {
            query: sender_query.to_string(),
            limit,
        })?;

        let needle = sender_query.to_lowercase();
        Ok(read(&self.mail)
            .iter()
            .filter(|m| m.summary.sender.to_lowercase().contains(&needle))
            .take(limit)
            .map(|m| m.summary.clone())
            .collect())
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
