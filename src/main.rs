use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tandem::conversation::{ConversationLoop, HumanInputMode, TerminationMarker};
use tandem::domain::{Role, Transcript};
use tandem::executor::LocalCommandExecutor;
use tandem::human::StdinHuman;
use tandem::responder::CommandResponder;
use tandem::storage::{TranscriptStore, load_file};
use tandem::summary::{Reflector, SummaryMethod, summarize};

mod cli;
mod config;

use cli::Cli;
use cli::commands::{Commands, RunArgs};
use config::Config;

fn setup_logging(default_filter: &str) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tandem")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("tandem.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Run(args) => handle_run_command(args, config).await,
        Commands::Show { transcript } => handle_show_command(transcript, config),
        Commands::Summarize { transcript, method } => handle_summarize_command(transcript, method, config).await,
        Commands::List => handle_list_command(config),
    }
}

async fn handle_run_command(args: &RunArgs, config: &Config) -> Result<()> {
    info!("Running conversation for task: {}", args.task);

    let mut settings = config.conversation.clone();
    if let Some(n) = args.max_auto_replies {
        settings.max_auto_replies = n;
    }
    if let Some(mode) = &args.human_input_mode {
        settings.human_input_mode = mode.parse::<HumanInputMode>()?;
    }
    if let Some(dir) = &args.work_dir {
        settings.working_dir = dir.clone();
    }
    let summary_method: SummaryMethod = args.summary.parse()?;
    let marker = TerminationMarker::new(settings.termination_marker.clone());

    let executor = Arc::new(LocalCommandExecutor::new(config.executor.clone()));
    let conversation_config = settings
        .into_config(executor)
        .context("Invalid conversation configuration")?;
    fs::create_dir_all(&conversation_config.working_dir).context(format!(
        "Failed to create working directory {}",
        conversation_config.working_dir.display()
    ))?;

    let mut responder_settings = config.responder.clone();
    if let Some(program) = &args.responder {
        responder_settings.program = program.clone();
        responder_settings.args = args.responder_args.clone();
    }
    if responder_settings.program.is_empty() {
        return Err(eyre!("No responder program configured; pass --responder or set responder.program"));
    }
    let responder = Arc::new(CommandResponder::new(responder_settings));

    println!(
        "{} {} {}",
        "Starting:".green(),
        args.task,
        format!("(working dir {})", conversation_config.working_dir.display()).dimmed()
    );

    let convo = ConversationLoop::new(responder.clone(), Arc::new(StdinHuman::new()), conversation_config);
    let outcome = convo.run(args.task.as_str()).await;

    print_transcript(&outcome.transcript);
    println!(
        "\n{} {:?} after {} turns, {} auto-replies",
        "Halted:".green(),
        outcome.halt_reason,
        outcome.turns,
        outcome.auto_replies
    );

    if config.storage.save_transcripts && !args.no_save {
        let store = TranscriptStore::new(&config.storage.transcript_dir)?;
        let path = store.save(&outcome.transcript)?;
        println!("{} {}", "Saved:".green(), path.display());
    }

    if let Some(err) = outcome.error {
        return Err(eyre::Report::new(err).wrap_err("Conversation halted with an error"));
    }

    let summary = summarize(&outcome.transcript, summary_method, &marker, Some(&*responder as &dyn Reflector)).await?;
    if !summary.is_empty() {
        println!("\n{}\n{}", "Summary:".cyan().bold(), summary);
    }
    Ok(())
}

fn handle_show_command(transcript: &str, config: &Config) -> Result<()> {
    info!("Showing transcript: {}", transcript);
    let transcript = open_transcript(transcript, config)?;
    print_transcript(&transcript);
    Ok(())
}

async fn handle_summarize_command(transcript: &str, method: &str, config: &Config) -> Result<()> {
    info!("Summarizing transcript: {} ({})", transcript, method);
    let method: SummaryMethod = method.parse()?;
    let transcript = open_transcript(transcript, config)?;
    let marker = TerminationMarker::new(config.conversation.termination_marker.clone());

    let responder = CommandResponder::new(config.responder.clone());
    let reflector: Option<&dyn Reflector> = if config.responder.program.is_empty() {
        None
    } else {
        Some(&responder)
    };
    let summary = summarize(&transcript, method, &marker, reflector).await?;
    println!("{}", summary);
    Ok(())
}

fn handle_list_command(config: &Config) -> Result<()> {
    let store = TranscriptStore::new(&config.storage.transcript_dir)?;
    let ids = store.list()?;
    if ids.is_empty() {
        println!("{}", "No saved transcripts".yellow());
    }
    for id in ids {
        println!("{}", id);
    }
    Ok(())
}

/// Resolve a transcript argument as a file path first, then as a stored id
fn open_transcript(arg: &str, config: &Config) -> Result<Transcript> {
    let path = Path::new(arg);
    if path.is_file() {
        return load_file(path).context(format!("Failed to load {}", path.display()));
    }
    let store = TranscriptStore::new(&config.storage.transcript_dir)?;
    store.load(arg).context(format!("Failed to load transcript {}", arg))
}

fn print_transcript(transcript: &Transcript) {
    for message in transcript.messages() {
        let header = match message.role() {
            Role::Responder => "responder".blue().bold(),
            Role::Executor => "executor".green().bold(),
            Role::Human => "human".magenta().bold(),
        };
        println!("\n{} {}", header, message.created_at().format("%H:%M:%S").to_string().dimmed());
        println!("{}", message.content());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging with the configured level
    setup_logging(config.log_filter()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
