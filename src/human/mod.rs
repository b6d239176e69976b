//! Human input - the person who can step in for the executor.
//!
//! `None` from [`HumanInput::ask`] means the human declined to answer, which
//! ends the conversation. An empty string means "carry on automatically".

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use colored::*;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};

use crate::domain::Message;
use crate::error::{Result, TandemError};

/// Typing this ends the conversation
pub const EXIT_COMMAND: &str = "exit";

/// Source of human replies
#[async_trait]
pub trait HumanInput: Send + Sync {
    /// Ask for a reply to `message`; `None` when the human declines
    async fn ask(&self, message: &Message, prompt: &str) -> Result<Option<String>>;
}

/// Reads replies line by line from the terminal, or any buffered reader.
///
/// One reader is kept for the whole conversation, so lines that arrive
/// together (piped or pasted input) are answered one per turn.
#[derive(Debug)]
pub struct StdinHuman<R = BufReader<Stdin>> {
    reader: tokio::sync::Mutex<R>,
}

impl StdinHuman {
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }
}

impl Default for StdinHuman {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> StdinHuman<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader: tokio::sync::Mutex::new(reader),
        }
    }
}

#[async_trait]
impl<R> HumanInput for StdinHuman<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn ask(&self, message: &Message, prompt: &str) -> Result<Option<String>> {
        let mut reader = self.reader.lock().await;

        let mut stdout = tokio::io::stdout();
        let banner = format!(
            "\n{} {}\n{}\n{} ",
            message.role().to_string().cyan().bold(),
            "said:".cyan(),
            message.content(),
            prompt.yellow()
        );
        stdout
            .write_all(banner.as_bytes())
            .await
            .map_err(|e| TandemError::HumanInput(e.to_string()))?;
        stdout
            .flush()
            .await
            .map_err(|e| TandemError::HumanInput(e.to_string()))?;

        let mut line = String::new();
        let read = reader
            .read_line(&mut line)
            .await
            .map_err(|e| TandemError::HumanInput(e.to_string()))?;

        Ok(interpret_reply(read, &line))
    }
}

/// Map a raw line to a reply; EOF or the exit command decline
fn interpret_reply(bytes_read: usize, line: &str) -> Option<String> {
    if bytes_read == 0 {
        return None;
    }
    let reply = line.trim_end_matches(['\n', '\r']);
    if reply.trim().eq_ignore_ascii_case(EXIT_COMMAND) {
        None
    } else {
        Some(reply.to_string())
    }
}

/// Replays canned human replies; declines once they run out
#[derive(Debug, Default)]
pub struct ScriptedHuman {
    replies: Mutex<VecDeque<Option<String>>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedHuman {
    pub fn new<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// A human who always declines
    pub fn declining() -> Self {
        Self::default()
    }

    /// Contents of the messages the human was asked about
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl HumanInput for ScriptedHuman {
    async fn ask(&self, message: &Message, _prompt: &str) -> Result<Option<String>> {
        self.asked
            .lock()
            .map_err(|e| TandemError::HumanInput(e.to_string()))?
            .push(message.content().to_string());
        let reply = self
            .replies
            .lock()
            .map_err(|e| TandemError::HumanInput(e.to_string()))?
            .pop_front()
            .flatten();
        Ok(reply)
    }
}
