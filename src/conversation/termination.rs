//! Termination predicates - pure tests over a single message.

use crate::domain::Message;

/// Default text a responder appends when the task is done
pub const DEFAULT_TERMINATION_MARKER: &str = "TERMINATE";

/// Decides whether a message ends the conversation.
///
/// Must be pure: the same message always yields the same answer.
pub trait TerminationPredicate: Send + Sync {
    fn is_termination(&self, message: &Message) -> bool;
}

impl<F> TerminationPredicate for F
where
    F: Fn(&Message) -> bool + Send + Sync,
{
    fn is_termination(&self, message: &Message) -> bool {
        self(message)
    }
}

/// Terminates when the trimmed content ends with a marker string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminationMarker {
    marker: String,
}

impl TerminationMarker {
    pub fn new(marker: impl Into<String>) -> Self {
        Self { marker: marker.into() }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Content with a trailing marker removed
    pub fn strip<'a>(&self, content: &'a str) -> &'a str {
        let trimmed = content.trim_end();
        trimmed
            .strip_suffix(self.marker.as_str())
            .map(str::trim_end)
            .unwrap_or(trimmed)
    }
}

impl Default for TerminationMarker {
    fn default() -> Self {
        Self::new(DEFAULT_TERMINATION_MARKER)
    }
}

impl TerminationPredicate for TerminationMarker {
    fn is_termination(&self, message: &Message) -> bool {
        !self.marker.is_empty() && message.content().trim_end().ends_with(&self.marker)
    }
}

/// Never terminates; the turn budget alone bounds the conversation
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverTerminate;

impl TerminationPredicate for NeverTerminate {
    fn is_termination(&self, _message: &Message) -> bool {
        false
    }
}
