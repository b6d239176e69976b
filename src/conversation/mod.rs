//! Conversation loop - the alternating responder/executor exchange.
//!
//! This module provides the core conversation logic, including:
//! - ConversationLoop for running a single bounded conversation
//! - TurnPolicy, the state machine that picks each executor action
//! - Termination predicates and the opening task message
//! - ConversationConfig and its file-level settings

pub mod config;
mod controller;
pub mod initial;
pub mod policy;
pub mod termination;

pub use config::{ConversationConfig, ConversationConfigBuilder, ConversationSettings, HumanInputMode};
pub use controller::{ConversationLoop, ConversationOutcome, HUMAN_PROMPT};
pub use initial::{Context, InitialMessage, MessageGenerator};
pub use policy::{AutoAction, HaltReason, TurnDecision, TurnPolicy, TurnState};
pub use termination::{DEFAULT_TERMINATION_MARKER, NeverTerminate, TerminationMarker, TerminationPredicate};
