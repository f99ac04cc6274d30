//! # CLI Arguments
//!
//! Command-line argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Deskhand - click what you see, type what you say
#[derive(Parser, Debug, Default)]
#[command(name = "deskhand")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Extra config file, applied after the global and project files
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log input events instead of injecting them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Pause after each action in milliseconds (overrides config)
    #[arg(long, global = true)]
    pub pause_ms: Option<u64>,

    /// Disable the fail-safe corner abort
    #[arg(long, global = true)]
    pub no_failsafe: bool,

    /// Template match confidence in (0, 1] (overrides config)
    #[arg(long, global = true)]
    pub confidence: Option<f32>,

    /// Treat type commands without quoted text as unknown
    #[arg(long, global = true)]
    pub strict_quotes: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process a single command and exit
    Run {
        /// Command text, e.g. 'type "hello"'
        command: String,

        /// Print the intent and outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Locate a reference image on screen
    Locate {
        /// Path to the reference image
        image: PathBuf,
    },

    /// List monitors and their geometry
    Monitors,

    /// Print the effective configuration
    Config,
}
