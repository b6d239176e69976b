//! Post-conversation summaries.
//!
//! Runs once after the loop halts, over the finalized transcript.

use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::conversation::TerminationMarker;
use crate::domain::{Role, Transcript};
use crate::error::{Result, TandemError};

/// Instruction passed to a reflector
pub const REFLECTION_PROMPT: &str = "Summarize the takeaway from the conversation. Do not add any introductory phrases.";

/// How to condense a transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryMethod {
    /// No summary
    None,
    /// Last responder message, minus any termination marker
    LastMessage,
    /// Ask a reflector to write one
    Reflection,
}

impl FromStr for SummaryMethod {
    type Err = TandemError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "none" => Ok(SummaryMethod::None),
            "last_message" | "last_msg" => Ok(SummaryMethod::LastMessage),
            "reflection" => Ok(SummaryMethod::Reflection),
            other => Err(TandemError::InvalidState(format!("unknown summary method: {}", other))),
        }
    }
}

/// Writes a summary of a transcript, typically by asking a model
#[async_trait]
pub trait Reflector: Send + Sync {
    async fn reflect(&self, transcript: &Transcript, prompt: &str) -> Result<String>;
}

/// Summarize a transcript with the given method
pub async fn summarize(
    transcript: &Transcript,
    method: SummaryMethod,
    marker: &TerminationMarker,
    reflector: Option<&dyn Reflector>,
) -> Result<String> {
    match method {
        SummaryMethod::None => Ok(String::new()),
        SummaryMethod::LastMessage => Ok(transcript
            .last_from(Role::Responder)
            .map(|m| marker.strip(m.content()).to_string())
            .unwrap_or_default()),
        SummaryMethod::Reflection => {
            let reflector = reflector.ok_or_else(|| {
                TandemError::InvalidState("reflection summary requires a reflector".to_string())
            })?;
            if transcript.is_empty() {
                return Ok(String::new());
            }
            reflector.reflect(transcript, REFLECTION_PROMPT).await
        }
    }
}
