//! Extraction of fenced code blocks from message content.
//!
//! A block opens with a line starting with three backticks, optionally
//! followed by a language tag, and closes with a line that is only three
//! backticks. Unterminated blocks are ignored.

use serde::{Deserialize, Serialize};

const FENCE: &str = "```";
const FILENAME_HINT: &str = "filename:";

/// Languages the executor knows how to run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Shell,
    /// Any other tag, kept verbatim
    Other(String),
}

impl Language {
    /// Map a fence tag to a language
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "python" | "python3" | "py" => Language::Python,
            "sh" | "bash" | "shell" | "console" | "zsh" => Language::Shell,
            other => Language::Other(other.to_string()),
        }
    }

    /// Guess a language for an untagged block
    pub fn infer(code: &str) -> Self {
        let first = code.trim_start().lines().next().unwrap_or("").trim();
        let shell_prefixes = ["pip ", "pip3 ", "python ", "python3 ", "#!/bin/sh", "#!/bin/bash", "$ "];
        if shell_prefixes.iter().any(|p| first.starts_with(p)) {
            Language::Shell
        } else {
            Language::Python
        }
    }

    /// File extension used when writing the block to disk
    pub fn extension(&self) -> &str {
        match self {
            Language::Python => "py",
            Language::Shell => "sh",
            Language::Other(tag) if tag.is_empty() => "txt",
            Language::Other(tag) => tag,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Language::Python => "python",
            Language::Shell => "sh",
            Language::Other(tag) => tag,
        }
    }
}

/// One executable block lifted out of a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub language: Language,
    pub code: String,
}

impl CodeBlock {
    pub fn new(language: Language, code: impl Into<String>) -> Self {
        Self {
            language,
            code: code.into(),
        }
    }

    /// File name requested by a `# filename: <name>` first line, if any
    pub fn filename_hint(&self) -> Option<&str> {
        let first = self.code.lines().next()?.trim();
        let rest = first
            .strip_prefix('#')
            .or_else(|| first.strip_prefix("//"))?
            .trim_start();
        let name = rest.strip_prefix(FILENAME_HINT)?.trim();
        if name.is_empty() { None } else { Some(name) }
    }
}

/// Extract every complete fenced block in `content`, in order of appearance
pub fn extract_code_blocks(content: &str) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in content.lines() {
        let trimmed = line.trim();
        match current.take() {
            None => {
                if let Some(tag) = trimmed.strip_prefix(FENCE) {
                    // A tag containing spaces is prose, not a language
                    let tag = tag.trim();
                    if !tag.contains(char::is_whitespace) && !tag.contains('`') {
                        current = Some((tag.to_string(), Vec::new()));
                    }
                }
            }
            Some((tag, mut lines)) => {
                if trimmed == FENCE {
                    let code = lines.join("\n");
                    let language = if tag.is_empty() {
                        Language::infer(&code)
                    } else {
                        Language::from_tag(&tag)
                    };
                    if !code.trim().is_empty() {
                        blocks.push(CodeBlock::new(language, code));
                    }
                } else {
                    lines.push(line);
                    current = Some((tag, lines));
                }
            }
        }
    }

    blocks
}

/// Whether `content` holds at least one executable block
pub fn has_code_blocks(content: &str) -> bool {
    !extract_code_blocks(content).is_empty()
}
