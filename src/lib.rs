//! Tandem - a two-party code-writing conversation loop
//!
//! A responder proposes messages that may carry fenced code blocks; the
//! executor runs those blocks in a working directory and reports the output
//! back, until a termination predicate fires, the auto-reply budget runs out,
//! or a human steps in.

pub mod conversation;
pub mod domain;
pub mod error;
pub mod executor;
pub mod human;
pub mod id;
pub mod responder;
pub mod storage;
pub mod summary;

pub use error::{ConfigError, ExecutionError, ResponderError, Result, TandemError};
