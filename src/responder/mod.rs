//! Responder layer - the role that proposes the next message.
//!
//! This module provides:
//! - Responder trait: the narrow interface the conversation loop calls each turn
//! - ScriptedResponder: replays canned replies, for tests and demos
//! - CommandResponder: delegates each turn to an external program

pub mod command;

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::conversation::ConversationConfig;
use crate::domain::{Message, Transcript};
use crate::error::ResponderError;

pub use command::{CommandResponder, CommandResponderSettings};

/// Produces the next message given the conversation so far.
///
/// Any retry or backoff belongs inside the implementation; the conversation
/// loop treats an `Err` as final.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, transcript: &Transcript, config: &ConversationConfig) -> Result<Message, ResponderError>;
}

#[derive(Debug, Clone)]
enum ScriptStep {
    Reply(String),
    Fail(String),
}

/// Responder that replays a fixed script.
///
/// Once the script runs out it either repeats a fallback reply or fails with
/// [`ResponderError::Exhausted`].
#[derive(Debug, Default)]
pub struct ScriptedResponder {
    steps: Mutex<VecDeque<ScriptStep>>,
    fallback: Option<String>,
    /// Transcript length observed on each call
    seen: Mutex<Vec<usize>>,
}

impl ScriptedResponder {
    /// Replay these replies in order
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            steps: Mutex::new(replies.into_iter().map(|r| ScriptStep::Reply(r.into())).collect()),
            fallback: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Always reply with the same text
    pub fn repeating(reply: impl Into<String>) -> Self {
        Self {
            fallback: Some(reply.into()),
            ..Default::default()
        }
    }

    /// Queue an upstream failure after the current script
    pub fn then_fail(self, reason: impl Into<String>) -> Self {
        if let Ok(mut steps) = self.steps.lock() {
            steps.push_back(ScriptStep::Fail(reason.into()));
        }
        self
    }

    /// Number of times `respond` was called
    pub fn calls(&self) -> usize {
        self.seen.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Transcript length at each call
    pub fn seen_lengths(&self) -> Vec<usize> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Responder for ScriptedResponder {
    async fn respond(&self, transcript: &Transcript, _config: &ConversationConfig) -> Result<Message, ResponderError> {
        let calls = {
            let mut seen = self
                .seen
                .lock()
                .map_err(|e| ResponderError::Upstream(e.to_string()))?;
            seen.push(transcript.len());
            seen.len()
        };

        let step = self
            .steps
            .lock()
            .map_err(|e| ResponderError::Upstream(e.to_string()))?
            .pop_front();

        match step {
            Some(ScriptStep::Reply(text)) => Ok(Message::responder(text)),
            Some(ScriptStep::Fail(reason)) => Err(ResponderError::Upstream(reason)),
            None => match &self.fallback {
                Some(text) => Ok(Message::responder(text.clone())),
                None => Err(ResponderError::Exhausted(calls - 1)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::LocalCommandExecutor;
    use std::sync::Arc;

    fn config() -> ConversationConfig {
        ConversationConfig::builder()
            .executor(Arc::new(LocalCommandExecutor::default()))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_scripted_replays_in_order() {
        let responder = ScriptedResponder::new(["first", "second"]);
        let transcript = Transcript::new();

        let a = responder.respond(&transcript, &config()).await.unwrap();
        let b = responder.respond(&transcript, &config()).await.unwrap();
        assert_eq!(a.content(), "first");
        assert_eq!(b.content(), "second");

        let err = responder.respond(&transcript, &config()).await.unwrap_err();
        assert!(matches!(err, ResponderError::Exhausted(2)));
        assert_eq!(responder.calls(), 3);
    }

    #[tokio::test]
    async fn test_scripted_repeating() {
        let responder = ScriptedResponder::repeating("again");
        let transcript = Transcript::new();
        for _ in 0..3 {
            let msg = responder.respond(&transcript, &config()).await.unwrap();
            assert_eq!(msg.content(), "again");
        }
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let responder = ScriptedResponder::new(["ok"]).then_fail("upstream 500");
        let transcript = Transcript::new();

        assert!(responder.respond(&transcript, &config()).await.is_ok());
        let err = responder.respond(&transcript, &config()).await.unwrap_err();
        assert!(matches!(err, ResponderError::Upstream(reason) if reason == "upstream 500"));
    }
}
