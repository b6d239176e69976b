//! Error types for Tandem
//!
//! Centralized error handling using thiserror.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failure of the responder collaborator
#[derive(Debug, Error)]
pub enum ResponderError {
    /// Responder process could not be started
    #[error("Failed to spawn responder: {0}")]
    Spawn(String),

    /// Upstream call failed
    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// Reply could not be understood
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Responder did not answer in time
    #[error("Responder timed out after {0:?}")]
    Timeout(Duration),

    /// Scripted responder has no more replies
    #[error("Responder script exhausted after {0} replies")]
    Exhausted(usize),
}

/// Failure to run a code block at all (as opposed to a run that exits non-zero)
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Working directory missing or not a directory
    #[error("Working directory inaccessible: {}", .0.display())]
    WorkingDirectory(PathBuf),

    /// Interpreter process could not be started
    #[error("Failed to start process: {0}")]
    Spawn(String),

    /// Code file could not be written
    #[error("Failed to write code file: {0}")]
    WriteCode(String),
}

/// Invalid conversation configuration, rejected before the loop starts
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Auto-reply budget below zero
    #[error("max_auto_replies must be >= 0, got {0}")]
    NegativeBudget(i64),

    /// Required collaborator was not provided
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    /// Unknown human input mode name
    #[error("Unknown human input mode: {0}")]
    UnknownHumanInputMode(String),

    /// Working directory is unusable
    #[error("Invalid working directory: {0}")]
    WorkingDirectory(String),
}

/// All error types that can occur in Tandem
#[derive(Debug, Error)]
pub enum TandemError {
    /// Responder collaborator failed
    #[error("Responder error: {0}")]
    Responder(#[from] ResponderError),

    /// Code execution could not be performed
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Configuration rejected
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Human input collaborator failed
    #[error("Human input error: {0}")]
    HumanInput(String),

    /// Invalid state transition or operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Transcript persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Tandem operations
pub type Result<T> = std::result::Result<T, TandemError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_responder_error_display() {
        let err = ResponderError::Upstream("rate limited".to_string());
        assert_eq!(err.to_string(), "Upstream failure: rate limited");

        let err = ResponderError::Exhausted(3);
        assert_eq!(err.to_string(), "Responder script exhausted after 3 replies");
    }

    #[test]
    fn test_execution_error_display() {
        let err = ExecutionError::WorkingDirectory(PathBuf::from("/nope"));
        assert_eq!(err.to_string(), "Working directory inaccessible: /nope");

        let err = ExecutionError::Spawn("python3: not found".to_string());
        assert_eq!(err.to_string(), "Failed to start process: python3: not found");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::NegativeBudget(-1);
        assert_eq!(err.to_string(), "max_auto_replies must be >= 0, got -1");

        let err = ConfigError::Missing("executor");
        assert_eq!(err.to_string(), "Missing required setting: executor");
    }

    #[test]
    fn test_wrapped_errors() {
        let err: TandemError = ResponderError::Malformed("empty".to_string()).into();
        assert!(matches!(err, TandemError::Responder(_)));
        assert_eq!(err.to_string(), "Responder error: Malformed response: empty");

        let err: TandemError = ConfigError::NegativeBudget(-1).into();
        assert!(matches!(err, TandemError::Config(ConfigError::NegativeBudget(-1))));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TandemError = io_err.into();
        assert!(matches!(err, TandemError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: TandemError = json_err.into();
        assert!(matches!(err, TandemError::Json(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(TandemError::InvalidState("test".to_string()))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
