//! # Interactive REPL
//!
//! Reads one command per line and hands it to the [`Assistant`].

use colored::Colorize;
use deskhand_core::Assistant;
use rustyline::error::ReadlineError;
use rustyline::{history::FileHistory, Config, Editor};
use std::path::PathBuf;
use tracing::warn;

const PROMPT: &str = "Enter command (or 'quit' to exit): ";

/// What to do with one line of input.
#[derive(Debug, PartialEq, Eq)]
enum LineAction<'a> {
    Skip,
    Quit,
    Process(&'a str),
}

fn classify(line: &str) -> LineAction<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        LineAction::Skip
    } else if trimmed.eq_ignore_ascii_case("quit") {
        LineAction::Quit
    } else {
        LineAction::Process(line)
    }
}

fn history_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("deskhand").join("history.txt"))
        .unwrap_or_else(|| PathBuf::from(".deskhand_history"))
}

fn print_welcome(dry_run: bool) {
    println!("{}", "Deskhand".bright_cyan().bold());
    println!(
        "{}",
        "Try: click \"path/to/button.png\"  or  type \"hello\"".dimmed()
    );
    if dry_run {
        println!("{}", "Dry run: input events are logged, not injected".yellow());
    }
    println!();
}

/// Run the interactive loop until `quit`, Ctrl-C or Ctrl-D.
pub async fn run(assistant: &Assistant, dry_run: bool) -> anyhow::Result<()> {
    print_welcome(dry_run);

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();

    let history_path = history_path();
    let mut rl: Editor<(), FileHistory> = Editor::with_config(config)?;
    let _ = rl.load_history(&history_path);

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => match classify(&line) {
                LineAction::Skip => continue,
                LineAction::Quit => break,
                LineAction::Process(command) => {
                    if assistant.process_command(command).await {
                        println!("{}", "Command executed successfully".green());
                    } else {
                        println!("{}", "Failed to execute command".red());
                    }
                }
            },
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(err) => {
                eprintln!("{} {:?}", "Error:".red().bold(), err);
                break;
            }
        }
    }

    if let Some(parent) = history_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = rl.save_history(&history_path) {
        warn!(error = %e, "Failed to save history");
    }

    Ok(())
}
