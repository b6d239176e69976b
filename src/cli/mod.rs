//! CLI module for tandem - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for running a conversation
//! and inspecting saved transcripts.

pub mod commands;

pub use commands::Cli;
