//! Turn policy - decides what the executor does with each responder message.
//!
//! The termination predicate is always checked first, so a terminating
//! message never triggers execution. After that the human input mode and the
//! remaining auto-reply budget pick between executing, replying
//! automatically, asking a human, or stopping.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::config::HumanInputMode;
use super::termination::TerminationPredicate;
use crate::domain::Message;
use crate::executor::{CodeBlock, extract_code_blocks};

/// Where the conversation currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    AwaitingResponse,
    Executing,
    AwaitingHuman,
    Terminated,
    Error,
}

impl TurnState {
    /// Check if no further turns can happen
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnState::Terminated | TurnState::Error)
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TurnState::AwaitingResponse => "awaiting_response",
            TurnState::Executing => "executing",
            TurnState::AwaitingHuman => "awaiting_human",
            TurnState::Terminated => "terminated",
            TurnState::Error => "error",
        };
        f.write_str(name)
    }
}

/// Why a conversation stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
    /// A responder message satisfied the termination predicate
    TerminationPredicate,
    /// Auto-reply budget ran out with no human to hand over to
    BudgetExhausted,
    /// The human declined to answer
    HumanDeclined,
    /// A collaborator failed
    Error,
}

impl HaltReason {
    pub fn final_state(&self) -> TurnState {
        match self {
            HaltReason::Error => TurnState::Error,
            _ => TurnState::Terminated,
        }
    }
}

/// An executor reply that needs no human
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoAction {
    Execute(Vec<CodeBlock>),
    /// Reply with the configured default text
    DefaultReply,
}

/// What the executor should do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnDecision {
    Terminate(HaltReason),
    Auto(AutoAction),
    AskHuman,
}

/// Tracks the auto-reply budget and maps messages to decisions
#[derive(Debug, Clone)]
pub struct TurnPolicy {
    mode: HumanInputMode,
    max_auto_replies: u32,
    remaining: u32,
    consumed: u32,
}

impl TurnPolicy {
    pub fn new(max_auto_replies: u32, mode: HumanInputMode) -> Self {
        Self {
            mode,
            max_auto_replies,
            remaining: max_auto_replies,
            consumed: 0,
        }
    }

    /// Auto-replies left before a human or termination is forced
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Auto-replies used over the whole conversation
    pub fn consumed(&self) -> u32 {
        self.consumed
    }

    /// Decide how to answer a freshly received responder message
    pub fn decide(&self, message: &Message, predicate: &dyn TerminationPredicate) -> TurnDecision {
        if predicate.is_termination(message) {
            return TurnDecision::Terminate(HaltReason::TerminationPredicate);
        }
        if self.mode == HumanInputMode::Always {
            return TurnDecision::AskHuman;
        }
        if self.remaining == 0 {
            return match self.mode {
                HumanInputMode::OnTerminate => TurnDecision::AskHuman,
                _ => TurnDecision::Terminate(HaltReason::BudgetExhausted),
            };
        }
        match self.decide_automatic(message) {
            Some(action) => TurnDecision::Auto(action),
            None => TurnDecision::Terminate(HaltReason::BudgetExhausted),
        }
    }

    /// Automatic answer, used when a human passes on their turn; `None` once
    /// the budget is spent
    pub fn decide_automatic(&self, message: &Message) -> Option<AutoAction> {
        if self.remaining == 0 {
            return None;
        }
        let blocks = extract_code_blocks(message.content());
        if blocks.is_empty() {
            Some(AutoAction::DefaultReply)
        } else {
            Some(AutoAction::Execute(blocks))
        }
    }

    /// Spend one unit of budget on an automatic reply
    pub fn consume(&mut self) {
        debug_assert!(self.remaining > 0, "consume called with no budget left");
        self.remaining = self.remaining.saturating_sub(1);
        self.consumed += 1;
    }

    /// Restore the full budget after a human takes a turn
    pub fn reset(&mut self) {
        self.remaining = self.max_auto_replies;
    }
}
