//! Domain types for Tandem
//!
//! This module contains the core conversation records:
//! - Message: one immutable entry, tagged with the role that produced it
//! - Transcript: the append-only sequence of messages for a conversation
//! - ExecutionResult: captured output of a single code block run

pub mod execution;
pub mod message;
pub mod transcript;

pub use execution::{ExecutionResult, ExitStatus};
pub use message::{Message, Role, metadata_keys};
pub use transcript::Transcript;
