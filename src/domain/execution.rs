//! Result of running a code block.

use serde::{Deserialize, Serialize};

/// Whether the executed code reported success
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitStatus {
    Success,
    Failure,
}

/// Captured outcome of one code block run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub exit_status: ExitStatus,
    /// Raw exit code when the process reported one
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    /// A successful run with the given stdout
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_status: ExitStatus::Success,
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed run with the given exit code and stderr
    pub fn failure(exit_code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self {
            exit_status: ExitStatus::Failure,
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Attach stdout to a result
    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn is_success(&self) -> bool {
        self.exit_status == ExitStatus::Success
    }

    /// Exit code as reported in conversation text (-1 when unknown)
    pub fn code_or_default(&self) -> i32 {
        match (self.exit_code, self.exit_status) {
            (Some(code), _) => code,
            (None, ExitStatus::Success) => 0,
            (None, ExitStatus::Failure) => 1,
        }
    }

    /// Stdout and stderr joined the way they are shown to the responder
    pub fn combined_output(&self) -> String {
        if self.stdout.is_empty() {
            self.stderr.clone()
        } else if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}
