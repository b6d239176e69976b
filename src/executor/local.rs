//! Local interpreter executor - writes a block to the working directory and runs it

use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::process::Command;

use super::code_block::{CodeBlock, Language};
use super::CodeExecutor;
use crate::domain::ExecutionResult;
use crate::error::ExecutionError;

/// Exit code reported when a run is killed for exceeding its timeout
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Settings for running code blocks locally
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorSettings {
    /// Per-block timeout in milliseconds
    pub timeout_ms: u64,
    /// Interpreter used for python blocks
    pub python: String,
    /// Interpreter used for shell blocks
    pub shell: String,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 60_000,
            python: "python3".to_string(),
            shell: "sh".to_string(),
        }
    }
}

impl ExecutorSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Runs code blocks through locally installed interpreters.
///
/// Provides no isolation: code runs with the permissions of the current
/// process, confined only by its working directory.
#[derive(Debug, Clone, Default)]
pub struct LocalCommandExecutor {
    settings: ExecutorSettings,
}

impl LocalCommandExecutor {
    pub fn new(settings: ExecutorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    fn interpreter(&self, language: &Language) -> Option<&str> {
        match language {
            Language::Python => Some(&self.settings.python),
            Language::Shell => Some(&self.settings.shell),
            Language::Other(_) => None,
        }
    }
}

/// Relative path the block is written to inside the working directory
fn code_file_name(block: &CodeBlock) -> Result<PathBuf, String> {
    if let Some(hint) = block.filename_hint() {
        let path = PathBuf::from(hint);
        let escapes = path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(format!("filename {} escapes the working directory", hint));
        }
        if path.file_name().is_none() {
            return Err(format!("filename {} does not name a file", hint));
        }
        return Ok(path);
    }

    let digest = Sha256::digest(block.code.as_bytes());
    let hash = hex::encode(digest);
    Ok(PathBuf::from(format!("tmp_code_{}.{}", &hash[..16], block.language.extension())))
}

#[async_trait]
impl CodeExecutor for LocalCommandExecutor {
    async fn execute(&self, block: &CodeBlock, working_dir: &Path) -> Result<ExecutionResult, ExecutionError> {
        let is_dir = tokio::fs::metadata(working_dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(ExecutionError::WorkingDirectory(working_dir.to_path_buf()));
        }

        let Some(interpreter) = self.interpreter(&block.language) else {
            return Ok(ExecutionResult::failure(
                Some(1),
                format!("unknown language {}", block.language.name()),
            ));
        };

        let file_name = match code_file_name(block) {
            Ok(name) => name,
            Err(reason) => return Ok(ExecutionResult::failure(Some(1), reason)),
        };
        let file_path = working_dir.join(&file_name);
        if tokio::fs::metadata(&file_path).await.is_ok_and(|m| m.is_dir()) {
            return Ok(ExecutionResult::failure(
                Some(1),
                format!("filename {} is a directory", file_name.display()),
            ));
        }
        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ExecutionError::WriteCode(format!("{}: {}", parent.display(), e)))?;
        }
        tokio::fs::write(&file_path, &block.code)
            .await
            .map_err(|e| ExecutionError::WriteCode(format!("{}: {}", file_path.display(), e)))?;

        debug!("Running {} with {} in {}", file_name.display(), interpreter, working_dir.display());

        let child = Command::new(interpreter)
            .arg(&file_name)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecutionError::Spawn(format!("{}: {}", interpreter, e)))?;

        let timeout = self.settings.timeout();
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(output) => output.map_err(|e| ExecutionError::Spawn(format!("{}: {}", interpreter, e)))?,
            Err(_) => {
                warn!("Code block {} timed out after {:?}", file_name.display(), timeout);
                return Ok(ExecutionResult::failure(Some(TIMEOUT_EXIT_CODE), "Timeout"));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if output.status.success() {
            Ok(ExecutionResult {
                stderr,
                ..ExecutionResult::success(stdout)
            })
        } else {
            Ok(ExecutionResult::failure(output.status.code(), stderr).with_stdout(stdout))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExitStatus;
    use tempfile::tempdir;

    fn shell(code: &str) -> CodeBlock {
        CodeBlock::new(Language::Shell, code)
    }

    #[tokio::test]
    async fn test_shell_echo() {
        let dir = tempdir().unwrap();
        let executor = LocalCommandExecutor::default();

        let result = executor
            .execute(&shell("echo 'Hello, World!'"), dir.path())
            .await
            .unwrap();

        assert!(result.is_success());
        assert!(result.stdout.contains("Hello, World!"));
    }

    #[tokio::test]
    async fn test_runs_in_working_directory() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "found").unwrap();

        let executor = LocalCommandExecutor::default();
        let result = executor.execute(&shell("cat marker.txt"), dir.path()).await.unwrap();

        assert!(result.is_success());
        assert!(result.stdout.contains("found"));
    }

    #[tokio::test]
    async fn test_failure_is_data_not_error() {
        let dir = tempdir().unwrap();
        let executor = LocalCommandExecutor::default();

        let result = executor
            .execute(&shell("echo 'bad thing' >&2\nexit 3"), dir.path())
            .await
            .unwrap();

        assert_eq!(result.exit_status, ExitStatus::Failure);
        assert_eq!(result.exit_code, Some(3));
        assert!(result.stderr.contains("bad thing"));
    }

    #[tokio::test]
    async fn test_missing_working_directory() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let executor = LocalCommandExecutor::default();

        let result = executor.execute(&shell("echo hi"), &missing).await;
        assert!(matches!(result, Err(ExecutionError::WorkingDirectory(_))));
    }

    #[tokio::test]
    async fn test_missing_interpreter() {
        let dir = tempdir().unwrap();
        let executor = LocalCommandExecutor::new(ExecutorSettings {
            shell: "definitely-not-a-real-interpreter".to_string(),
            ..Default::default()
        });

        let result = executor.execute(&shell("echo hi"), dir.path()).await;
        assert!(matches!(result, Err(ExecutionError::Spawn(_))));
    }

    #[tokio::test]
    async fn test_unknown_language() {
        let dir = tempdir().unwrap();
        let executor = LocalCommandExecutor::default();
        let block = CodeBlock::new(Language::Other("cobol".to_string()), "DISPLAY 'HI'.");

        let result = executor.execute(&block, dir.path()).await.unwrap();
        assert!(!result.is_success());
        assert!(result.stderr.contains("unknown language cobol"));
    }

    #[tokio::test]
    async fn test_timeout_reports_exit_code() {
        let dir = tempdir().unwrap();
        let executor = LocalCommandExecutor::new(ExecutorSettings {
            timeout_ms: 100,
            ..Default::default()
        });

        let result = executor.execute(&shell("sleep 10"), dir.path()).await.unwrap();
        assert_eq!(result.exit_code, Some(TIMEOUT_EXIT_CODE));
        assert_eq!(result.stderr, "Timeout");
    }

    #[tokio::test]
    async fn test_filename_hint_writes_named_file() {
        let dir = tempdir().unwrap();
        let executor = LocalCommandExecutor::default();

        let result = executor
            .execute(&shell("# filename: scripts/hello.sh\necho named"), dir.path())
            .await
            .unwrap();

        assert!(result.is_success());
        assert!(dir.path().join("scripts/hello.sh").exists());
    }

    #[test]
    fn test_filename_hint_cannot_escape() {
        let block = shell("# filename: ../evil.sh\necho no");
        assert!(code_file_name(&block).is_err());

        let block = shell("# filename: /etc/evil.sh\necho no");
        assert!(code_file_name(&block).is_err());
    }

    #[test]
    fn test_filename_hint_must_name_a_file() {
        assert!(code_file_name(&shell("# filename: .\necho no")).is_err());
        assert!(code_file_name(&shell("# filename: ./\necho no")).is_err());
    }

    #[tokio::test]
    async fn test_filename_hint_naming_directory_is_failed_run() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("scripts")).unwrap();
        let executor = LocalCommandExecutor::default();

        let result = executor
            .execute(&shell("# filename: scripts\necho no"), dir.path())
            .await
            .unwrap();
        assert_eq!(result.exit_code, Some(1));
        assert!(result.stderr.contains("is a directory"));

        let result = executor
            .execute(&shell("# filename: .\necho no"), dir.path())
            .await
            .unwrap();
        assert!(!result.is_success());
        assert!(result.stderr.contains("does not name a file"));
    }

    #[test]
    fn test_generated_file_name_is_stable() {
        let a = code_file_name(&shell("echo same")).unwrap();
        let b = code_file_name(&shell("echo same")).unwrap();
        assert_eq!(a, b);
        let name = a.to_string_lossy();
        assert!(name.starts_with("tmp_code_"));
        assert!(name.ends_with(".sh"));
    }
}
