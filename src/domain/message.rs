//! Conversation message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata keys the conversation loop attaches to messages
pub mod metadata_keys {
    /// How an executor message was produced ("execution", "auto_reply", "task")
    pub const SOURCE: &str = "source";
    /// Exit code of the last block run for an execution message
    pub const EXIT_CODE: &str = "exit_code";
    /// Number of code blocks found in the message that was executed
    pub const CODE_BLOCKS: &str = "code_blocks";
    /// Sender identity for the initial task message
    pub const SENDER: &str = "sender";
    /// Recipient identity for the initial task message
    pub const RECIPIENT: &str = "recipient";
}

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Proposes the next message, possibly with code
    Responder,
    /// Runs code and reports results
    Executor,
    /// A person answering in place of the executor
    Human,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Responder => "responder",
            Role::Executor => "executor",
            Role::Human => "human",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a conversation.
///
/// Fields are private: once built, a message is only ever read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    metadata: Map<String, Value>,
    created_at: DateTime<Utc>,
}

impl Message {
    /// Create a message for the given role
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            metadata: Map::new(),
            created_at: Utc::now(),
        }
    }

    /// Create a responder message
    pub fn responder(content: impl Into<String>) -> Self {
        Self::new(Role::Responder, content)
    }

    /// Create an executor message
    pub fn executor(content: impl Into<String>) -> Self {
        Self::new(Role::Executor, content)
    }

    /// Create a human message
    pub fn human(content: impl Into<String>) -> Self {
        Self::new(Role::Human, content)
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Look up a single metadata value
    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_constructors_set_role() {
        assert_eq!(Message::responder("a").role(), Role::Responder);
        assert_eq!(Message::executor("b").role(), Role::Executor);
        assert_eq!(Message::human("c").role(), Role::Human);
        assert_eq!(Message::human("c").content(), "c");
    }

    #[test]
    fn test_metadata_builder() {
        let msg = Message::executor("exitcode: 0")
            .with_metadata(metadata_keys::EXIT_CODE, 0)
            .with_metadata(metadata_keys::SOURCE, "execution");

        assert_eq!(msg.meta(metadata_keys::EXIT_CODE), Some(&json!(0)));
        assert_eq!(msg.meta(metadata_keys::SOURCE), Some(&json!("execution")));
        assert!(msg.meta("missing").is_none());
        assert_eq!(msg.metadata().len(), 2);
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Responder).unwrap(), "\"responder\"");
        assert_eq!(serde_json::to_string(&Role::Human).unwrap(), "\"human\"");
        assert_eq!(Role::Executor.to_string(), "executor");
    }

    #[test]
    fn test_empty_metadata_is_skipped() {
        let json = serde_json::to_value(Message::responder("hi")).unwrap();
        assert!(json.get("metadata").is_none());
        assert_eq!(json["role"], "responder");
    }

    #[test]
    fn test_deserialize_without_metadata() {
        let msg: Message = serde_json::from_value(json!({
            "role": "executor",
            "content": "done",
            "created_at": "2026-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(msg.role(), Role::Executor);
        assert!(msg.metadata().is_empty());
    }
}
