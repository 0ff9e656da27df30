use crate::case::CaseType;
use crate::sentiment::Label;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "moodlog", version, about = "Mood journal with sentiment-aware replies")]
pub struct Cli {
    /// History file path (JSON array)
    #[arg(long, env = "MOODLOG_HISTORY", global = true)]
    pub history: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Analyze a journal entry, generate a reply, and save it to history
    Analyze(AnalyzeArgs),
    /// Classify and aggregate pre-scored segments read from stdin (offline)
    Classify(ClassifyArgs),
    /// Show how an entry would be chunked
    Chunk(ChunkArgs),
    /// List past entries, newest first
    History(HistoryArgs),
    /// Show pending tasks detected in an entry
    Tasks(TasksArgs),
}

#[derive(Parser)]
pub struct AnalyzeArgs {
    /// Entry text (read from stdin when omitted)
    pub text: Option<String>,

    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,

    /// Do not append the result to history
    #[arg(long)]
    pub no_persist: bool,

    /// Request chunking even when always_chunk is off
    #[arg(long)]
    pub chunk: bool,
}

#[derive(Parser)]
pub struct ClassifyArgs {
    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct ChunkArgs {
    /// Entry text (read from stdin when omitted)
    pub text: Option<String>,

    /// Override the configured chunk size
    #[arg(long)]
    pub size: Option<usize>,
}

#[derive(Parser)]
pub struct HistoryArgs {
    /// Maximum entries to show (default 10)
    #[arg(long, default_value = "10")]
    pub limit: usize,

    /// Only entries with this predicted label (negative, neutral, positive)
    #[arg(long)]
    pub label: Option<Label>,

    /// Only entries with this case type (e.g. polarity_shift)
    #[arg(long = "case")]
    pub case_type: Option<CaseType>,

    /// Print entries as a JSON array
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct TasksArgs {
    /// Entry text (read from stdin when omitted)
    pub text: Option<String>,
}
