//! # Config Command
//!
//! Print the effective configuration.

use crate::config::DeskhandConfig;
use colored::Colorize;

/// Run the config command
pub fn run(config: &DeskhandConfig) -> anyhow::Result<()> {
    println!("{}", "# Effective configuration".bright_cyan().bold());
    if let Some(path) = DeskhandConfig::global_config_path() {
        println!("{}", format!("# global:  {}", path.display()).dimmed());
    }
    println!(
        "{}",
        format!("# project: {}", DeskhandConfig::project_config_path().display()).dimmed()
    );
    println!();
    print!("{}", config.to_toml()?);
    Ok(())
}
