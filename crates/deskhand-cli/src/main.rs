//! # Deskhand CLI
//!
//! The main entry point for the Deskhand desktop automation assistant.

mod cli;
mod commands;
mod config;
mod repl;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

use cli::{Cli, Commands};
use config::DeskhandConfig;

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    // Enable ANSI colors on Windows
    #[cfg(windows)]
    let _ = colored::control::set_virtual_terminal(true);

    let cli = Cli::parse();

    // RUST_LOG wins; otherwise info, or debug with --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let mut config = DeskhandConfig::load(cli.config.as_deref()).await?;
    config.apply_cli(&cli);
    config.validate()?;

    match cli.command {
        Some(Commands::Run { ref command, json }) => {
            let assistant = commands::assistant(&config, cli.dry_run).await?;
            let ok = commands::run::run(&assistant, command, json).await?;
            Ok(exit_code(ok))
        }
        Some(Commands::Locate { ref image }) => {
            let found = commands::locate::run(image, &config).await?;
            Ok(exit_code(found))
        }
        Some(Commands::Monitors) => {
            commands::monitors::run().await?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Config) => {
            commands::config::run(&config)?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            let assistant = commands::assistant(&config, cli.dry_run).await?;
            repl::run(&assistant, cli.dry_run).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
