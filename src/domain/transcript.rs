//! Append-only conversation transcript.

use serde::{Deserialize, Serialize};

use super::message::{Message, Role};
use crate::error::{Result, TandemError};
use crate::id::generate_conversation_id;

/// Ordered record of every message in one conversation.
///
/// The only mutating operation is [`Transcript::append`]; there is no way to
/// remove or reorder entries. After [`Transcript::finalize`] even appends fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    id: String,
    messages: Vec<Message>,
    #[serde(default)]
    finalized: bool,
}

impl Transcript {
    /// Start an empty transcript with a fresh conversation id
    pub fn new() -> Self {
        Self::with_id(generate_conversation_id())
    }

    /// Start an empty transcript with a known id
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
            finalized: false,
        }
    }

    /// Rebuild a finalized transcript from stored messages
    pub(crate) fn restore(id: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            id: id.into(),
            messages,
            finalized: true,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Append a message, returning its index
    pub fn append(&mut self, message: Message) -> Result<usize> {
        if self.finalized {
            return Err(TandemError::InvalidState(format!(
                "transcript {} is finalized",
                self.id
            )));
        }
        self.messages.push(message);
        Ok(self.messages.len() - 1)
    }

    /// Freeze the transcript; later appends fail
    pub fn finalize(&mut self) {
        self.finalized = true;
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Most recent message from the given role
    pub fn last_from(&self, role: Role) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role() == role)
    }

    /// Number of messages from the given role
    pub fn count_role(&self, role: Role) -> usize {
        self.messages.iter().filter(|m| m.role() == role).count()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}
