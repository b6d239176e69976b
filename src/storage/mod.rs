//! Storage layer for Tandem - JSONL persistence of finished transcripts.

mod jsonl;

pub use jsonl::{TranscriptStore, load_file};
