//! Code execution for the executor role.
//!
//! This module provides:
//! - CodeExecutor trait: the narrow interface the conversation loop runs code through
//! - Code block extraction from message content
//! - LocalCommandExecutor: runs blocks through local interpreters (no isolation)
//! - Formatting of execution results into the executor's reply

pub mod code_block;
pub mod format;
pub mod local;

use std::path::Path;

use async_trait::async_trait;

use crate::domain::ExecutionResult;
use crate::error::ExecutionError;

pub use code_block::{CodeBlock, Language, extract_code_blocks, has_code_blocks};
pub use format::{ExecutionReport, execute_blocks, truncate_output};
pub use local::{ExecutorSettings, LocalCommandExecutor};

/// Runs a single code block inside a working directory.
///
/// Implementations must not touch the transcript; results flow back to the
/// conversation loop only through the returned value. A run that exits
/// non-zero is an `Ok` result with a failure status. `Err` is reserved for
/// runs that could not happen at all.
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    async fn execute(&self, block: &CodeBlock, working_dir: &Path) -> Result<ExecutionResult, ExecutionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_exports() {
        let block = CodeBlock::new(Language::Shell, "echo hi");
        assert_eq!(block.language.name(), "sh");
        assert!(has_code_blocks("```sh\necho hi\n```"));
    }
}
