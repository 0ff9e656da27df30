use clap::Parser;
use std::process::ExitCode;

use moodlog::MoodError;
use moodlog::cli::{Cli, Command};
use moodlog::commands;
use moodlog::config::load_config;

fn run() -> Result<ExitCode, MoodError> {
    let cli = Cli::parse();
    let config = load_config()?;

    match cli.command {
        Command::Analyze(args) => {
            let ok = commands::handle_analyze(&config, cli.history, args)?;
            return Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE });
        }
        Command::Classify(args) => commands::handle_classify(&config, args)?,
        Command::Chunk(args) => commands::handle_chunk(&config, args)?,
        Command::History(args) => commands::handle_history(&config, cli.history, args)?,
        Command::Tasks(args) => commands::handle_tasks(&config, args)?,
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("MOODLOG_LOG", "warn"))
        .format_timestamp(None)
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("moodlog: {e}");
            ExitCode::FAILURE
        }
    }
}
