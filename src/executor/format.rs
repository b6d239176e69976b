//! Running a message's code blocks and turning the results into a reply.

use std::path::Path;

use log::info;

use super::code_block::CodeBlock;
use super::CodeExecutor;
use crate::domain::ExecutionResult;
use crate::error::ExecutionError;

/// Aggregate outcome of running the blocks from one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    /// One entry per block that ran; stops after the first failure
    pub results: Vec<ExecutionResult>,
    /// Blocks found in the message, including ones skipped after a failure
    pub blocks_found: usize,
}

impl ExecutionReport {
    /// Exit code of the last block that ran
    pub fn exit_code(&self) -> i32 {
        self.results.last().map(|r| r.code_or_default()).unwrap_or(0)
    }

    pub fn succeeded(&self) -> bool {
        self.results.iter().all(|r| r.is_success())
    }

    /// Reply text sent back to the responder, truncated to `max_chars` of output
    pub fn to_reply(&self, max_chars: usize) -> String {
        let logs: String = self
            .results
            .iter()
            .map(|r| format!("\n{}", r.combined_output()))
            .collect();
        let status = if self.succeeded() {
            "execution succeeded"
        } else {
            "execution failed"
        };
        format!(
            "exitcode: {} ({})\nCode output: {}",
            self.exit_code(),
            status,
            truncate_output(&logs, max_chars)
        )
    }
}

/// Run blocks in order, stopping at the first one that fails
pub async fn execute_blocks(
    executor: &dyn CodeExecutor,
    blocks: &[CodeBlock],
    working_dir: &Path,
) -> Result<ExecutionReport, ExecutionError> {
    let mut results = Vec::with_capacity(blocks.len());

    for (i, block) in blocks.iter().enumerate() {
        info!(
            "Executing code block {} of {} ({})",
            i + 1,
            blocks.len(),
            block.language.name()
        );
        let result = executor.execute(block, working_dir).await?;
        let failed = !result.is_success();
        results.push(result);
        if failed {
            break;
        }
    }

    Ok(ExecutionReport {
        results,
        blocks_found: blocks.len(),
    })
}

/// Cut output down to `max_chars` characters, noting how much was dropped
pub fn truncate_output(output: &str, max_chars: usize) -> String {
    let total = output.chars().count();
    if total <= max_chars {
        return output.to_string();
    }
    let cut: String = output.chars().take(max_chars).collect();
    format!("{}...\n[truncated, {} chars total]", cut, total)
}
