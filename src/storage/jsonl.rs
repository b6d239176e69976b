//! JSONL transcript storage - one file per conversation, one message per line.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::domain::{Message, Transcript};
use crate::error::{Result, TandemError};

const EXTENSION: &str = "jsonl";

/// Directory of saved transcripts
#[derive(Debug, Clone)]
pub struct TranscriptStore {
    base_path: PathBuf,
}

impl TranscriptStore {
    /// Open a store at the given directory, creating it if needed
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Get the file path for a transcript id
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.base_path.join(format!("{}.{}", id, EXTENSION))
    }

    /// Write a finalized transcript; refuses to overwrite an existing one
    pub fn save(&self, transcript: &Transcript) -> Result<PathBuf> {
        if !transcript.is_finalized() {
            return Err(TandemError::InvalidState(format!(
                "transcript {} is still open",
                transcript.id()
            )));
        }
        let path = self.path_for(transcript.id());
        if path.exists() {
            return Err(TandemError::Storage(format!("{} already exists", path.display())));
        }

        let mut writer = BufWriter::new(File::create(&path)?);
        for message in transcript.messages() {
            writeln!(writer, "{}", serde_json::to_string(message)?)?;
        }
        writer.flush()?;

        info!("Saved transcript {} ({} messages)", path.display(), transcript.len());
        Ok(path)
    }

    /// Load a transcript by id
    pub fn load(&self, id: &str) -> Result<Transcript> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(TandemError::Storage(format!("Transcript not found: {}", id)));
        }
        load_file(&path)
    }

    /// Ids of all stored transcripts, sorted
    pub fn list(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// Load a transcript from any JSONL file; the file stem becomes its id
pub fn load_file(path: &Path) -> Result<Transcript> {
    let id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| TandemError::Storage(format!("Invalid transcript path: {}", path.display())))?;

    let reader = BufReader::new(File::open(path)?);
    let mut messages = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let message: Message = serde_json::from_str(&line)
            .map_err(|e| TandemError::Storage(format!("{}:{}: {}", path.display(), line_no + 1, e)))?;
        messages.push(message);
    }

    Ok(Transcript::restore(id, messages))
}
