//! # Run Command
//!
//! Process a single command and exit.

use colored::Colorize;
use deskhand_core::{Assistant, ExecutionResult, Intent};
use serde::Serialize;

#[derive(Serialize)]
struct Report<'a> {
    command: &'a str,
    intent: &'a Intent,
    result: &'a ExecutionResult,
}

/// Run the command. Returns whether an action was performed.
pub async fn run(assistant: &Assistant, command: &str, json: bool) -> anyhow::Result<bool> {
    let (intent, result) = assistant.process_detailed(command).await;

    if json {
        let report = Report {
            command,
            intent: &intent,
            result: &result,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if result.success {
        println!("{}", "Command executed successfully".green());
    } else {
        println!("{}", "Failed to execute command".red());
    }

    Ok(result.success)
}
