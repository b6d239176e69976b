//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: run a conversation for a task
//! - show: print a saved transcript
//! - summarize: summarize a saved transcript
//! - list: list saved transcripts

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Tandem - a responder/executor code conversation loop
#[derive(Parser, Debug)]
#[command(name = "tandem")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a conversation for a task
    Run(RunArgs),

    /// Print a saved transcript
    Show {
        /// Transcript id or path to a .jsonl file
        transcript: String,
    },

    /// Summarize a saved transcript
    Summarize {
        /// Transcript id or path to a .jsonl file
        transcript: String,

        /// Summary method (none, last-message, reflection)
        #[arg(short, long, default_value = "last-message")]
        method: String,
    },

    /// List saved transcripts
    List,
}

/// Options for `run`; each overrides the config file
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Task description sent as the first message
    pub task: String,

    /// Program that produces responder replies
    #[arg(short = 'r', long)]
    pub responder: Option<String>,

    /// Argument passed to the responder program (repeatable)
    #[arg(long = "responder-arg", allow_hyphen_values = true)]
    pub responder_args: Vec<String>,

    /// Maximum consecutive automatic replies
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    pub max_auto_replies: Option<i64>,

    /// When to ask for human input (always, never, on_terminate)
    #[arg(short = 'm', long)]
    pub human_input_mode: Option<String>,

    /// Directory code blocks run in
    #[arg(short = 'w', long)]
    pub work_dir: Option<PathBuf>,

    /// Summary method printed at the end (none, last-message, reflection)
    #[arg(short, long, default_value = "last-message")]
    pub summary: String,

    /// Don't save the transcript
    #[arg(long)]
    pub no_save: bool,
}
