//! The task message that opens a conversation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Free-form values a message generator may draw on
pub type Context = HashMap<String, Value>;

/// Builds the opening message from `(sender_id, recipient_id, context)`
pub type MessageGenerator = Arc<dyn Fn(&str, &str, &Context) -> String + Send + Sync>;

/// Opening message: fixed text or a generator resolved once at start
#[derive(Clone)]
pub enum InitialMessage {
    Literal(String),
    Generator(MessageGenerator),
}

impl InitialMessage {
    pub fn literal(text: impl Into<String>) -> Self {
        InitialMessage::Literal(text.into())
    }

    pub fn generator<F>(f: F) -> Self
    where
        F: Fn(&str, &str, &Context) -> String + Send + Sync + 'static,
    {
        InitialMessage::Generator(Arc::new(f))
    }

    /// Produce the message text
    pub fn resolve(&self, sender_id: &str, recipient_id: &str, context: &Context) -> String {
        match self {
            InitialMessage::Literal(text) => text.clone(),
            InitialMessage::Generator(f) => f(sender_id, recipient_id, context),
        }
    }
}

impl fmt::Debug for InitialMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitialMessage::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            InitialMessage::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

impl From<&str> for InitialMessage {
    fn from(text: &str) -> Self {
        InitialMessage::literal(text)
    }
}

impl From<String> for InitialMessage {
    fn from(text: String) -> Self {
        InitialMessage::Literal(text)
    }
}
