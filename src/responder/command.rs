//! Command responder - hands each turn to an external program
//!
//! The program receives the conversation as JSON on stdin and prints its reply
//! on stdout. How it produces that reply (model call, script, human relay) is
//! its own business.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::Responder;
use crate::conversation::ConversationConfig;
use crate::domain::{Message, Transcript};
use crate::error::{ResponderError, Result};
use crate::summary::Reflector;

/// Default instructions forwarded to the responder program
pub const DEFAULT_SYSTEM_MESSAGE: &str = "You are a helpful assistant that solves tasks by writing code. \
Put code the user should run in fenced blocks tagged with its language (python or sh). \
To save code to a named file, make its first line `# filename: <name>`. \
Use one block per reply unless the steps are independent. \
When the result checks out and the task is complete, reply with TERMINATE.";

/// Settings for the external responder program
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandResponderSettings {
    pub program: String,
    pub args: Vec<String>,
    pub timeout_ms: u64,
    pub system_message: String,
}

impl Default for CommandResponderSettings {
    fn default() -> Self {
        Self {
            program: String::new(),
            args: Vec::new(),
            timeout_ms: 300_000,
            system_message: DEFAULT_SYSTEM_MESSAGE.to_string(),
        }
    }
}

/// Responder backed by an external program
#[derive(Debug, Clone)]
pub struct CommandResponder {
    settings: CommandResponderSettings,
}

impl CommandResponder {
    pub fn new(settings: CommandResponderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CommandResponderSettings {
        &self.settings
    }

    fn build_request(&self, transcript: &Transcript, instruction: Option<&str>) -> Value {
        let messages: Vec<Value> = transcript
            .messages()
            .iter()
            .map(|m| {
                json!({
                    "role": m.role().as_str(),
                    "content": m.content()
                })
            })
            .collect();

        let mut body = json!({
            "conversation_id": transcript.id(),
            "system_message": self.settings.system_message,
            "messages": messages
        });
        if let Some(instruction) = instruction {
            body["instruction"] = json!(instruction);
        }
        body
    }

    async fn invoke(&self, request: Value) -> std::result::Result<String, ResponderError> {
        if self.settings.program.is_empty() {
            return Err(ResponderError::Spawn("no responder program configured".to_string()));
        }
        let body = serde_json::to_vec(&request).map_err(|e| ResponderError::Malformed(e.to_string()))?;

        let mut child = Command::new(&self.settings.program)
            .args(&self.settings.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ResponderError::Spawn(format!("{}: {}", self.settings.program, e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ResponderError::Spawn("responder stdin unavailable".to_string()))?;
        let write = async move {
            stdin.write_all(&body).await?;
            stdin.shutdown().await
        };

        let timeout = Duration::from_millis(self.settings.timeout_ms);
        let (written, output) = tokio::time::timeout(timeout, async { tokio::join!(write, child.wait_with_output()) })
            .await
            .map_err(|_| ResponderError::Timeout(timeout))?;

        if let Err(e) = written {
            // Programs may exit without reading stdin
            debug!("Responder did not consume request: {}", e);
        }
        let output = output.map_err(|e| ResponderError::Upstream(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResponderError::Upstream(format!(
                "exit code {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        let reply = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if reply.is_empty() {
            return Err(ResponderError::Malformed("empty reply".to_string()));
        }
        Ok(reply)
    }
}

#[async_trait]
impl Responder for CommandResponder {
    async fn respond(
        &self,
        transcript: &Transcript,
        _config: &ConversationConfig,
    ) -> std::result::Result<Message, ResponderError> {
        let reply = self.invoke(self.build_request(transcript, None)).await?;
        Ok(Message::responder(reply))
    }
}

#[async_trait]
impl Reflector for CommandResponder {
    async fn reflect(&self, transcript: &Transcript, prompt: &str) -> Result<String> {
        Ok(self.invoke(self.build_request(transcript, Some(prompt))).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::LocalCommandExecutor;
    use std::sync::Arc;

    fn sh(script: &str) -> CommandResponder {
        CommandResponder::new(CommandResponderSettings {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            timeout_ms: 5_000,
            ..Default::default()
        })
    }

    fn config() -> ConversationConfig {
        ConversationConfig::builder()
            .executor(Arc::new(LocalCommandExecutor::default()))
            .build()
            .unwrap()
    }

    fn transcript_with(task: &str) -> Transcript {
        let mut transcript = Transcript::with_id("conv-1");
        transcript.append(Message::executor(task)).unwrap();
        transcript
    }

    #[test]
    fn test_build_request() {
        let responder = CommandResponder::new(CommandResponderSettings::default());
        let body = responder.build_request(&transcript_with("Plot a chart"), None);

        assert_eq!(body["conversation_id"], "conv-1");
        assert_eq!(body["messages"][0]["role"], "executor");
        assert_eq!(body["messages"][0]["content"], "Plot a chart");
        assert!(body["system_message"].as_str().unwrap().contains("TERMINATE"));
        assert!(body.get("instruction").is_none());

        let body = responder.build_request(&transcript_with("x"), Some("Summarize"));
        assert_eq!(body["instruction"], "Summarize");
    }

    #[tokio::test]
    async fn test_reply_from_stdout() {
        let responder = sh("cat > /dev/null; echo 'hello from responder'");
        let msg = responder.respond(&transcript_with("hi"), &config()).await.unwrap();
        assert_eq!(msg.content(), "hello from responder");
        assert_eq!(msg.role(), crate::domain::Role::Responder);
    }

    #[tokio::test]
    async fn test_receives_transcript_on_stdin() {
        let responder = sh("grep -o 'Plot NVDA' | head -1");
        let msg = responder
            .respond(&transcript_with("Plot NVDA year to date"), &config())
            .await
            .unwrap();
        assert_eq!(msg.content(), "Plot NVDA");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_upstream_error() {
        let responder = sh("echo 'quota exceeded' >&2; exit 2");
        let err = responder.respond(&transcript_with("hi"), &config()).await.unwrap_err();
        match err {
            ResponderError::Upstream(msg) => {
                assert!(msg.contains("exit code 2"));
                assert!(msg.contains("quota exceeded"));
            }
            other => panic!("Expected upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_reply_is_malformed() {
        let responder = sh("cat > /dev/null");
        let err = responder.respond(&transcript_with("hi"), &config()).await.unwrap_err();
        assert!(matches!(err, ResponderError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_timeout() {
        let mut responder = sh("sleep 10");
        responder.settings.timeout_ms = 100;
        let err = responder.respond(&transcript_with("hi"), &config()).await.unwrap_err();
        assert!(matches!(err, ResponderError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let responder = CommandResponder::new(CommandResponderSettings::default());
        let err = responder.respond(&transcript_with("hi"), &config()).await.unwrap_err();
        assert!(matches!(err, ResponderError::Spawn(_)));
    }

    #[tokio::test]
    async fn test_reflect_passes_instruction() {
        let responder = sh("grep -o 'Summarize the takeaway' | head -1");
        let summary = responder
            .reflect(&transcript_with("task"), "Summarize the takeaway")
            .await
            .unwrap();
        assert_eq!(summary, "Summarize the takeaway");
    }
}
