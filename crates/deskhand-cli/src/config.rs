//! # CLI Configuration
//!
//! Layered configuration for the `deskhand` binary.
//!
//! Later layers win: defaults, global file, project file, `--config` file,
//! `DESKHAND_*` environment variables, command-line flags.

use crate::cli::Cli;
use anyhow::Context;
use deskhand_core::{LocatorConfig, ResolverConfig, SafetyConfig};
use deskhand_vision::VisionError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Effective configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskhandConfig {
    pub safety: SafetyConfig,
    pub locator: LocatorConfig,
    pub resolver: ResolverConfig,
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Recursively overlay `overlay` onto `base`.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

impl DeskhandConfig {
    /// `<config dir>/deskhand/config.toml`
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("deskhand").join("config.toml"))
    }

    /// `.deskhand/config.toml` in the working directory.
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(".deskhand").join("config.toml")
    }

    /// Load configuration from default locations plus an optional explicit
    /// file, then apply environment overrides.
    pub async fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let mut layers = Vec::new();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                layers.push(global_path);
            }
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            layers.push(project_path);
        }

        if let Some(path) = explicit {
            if !path.exists() {
                anyhow::bail!("config file not found: {}", path.display());
            }
            layers.push(path.to_path_buf());
        }

        let mut config = Self::from_files(&layers).await?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Merge the given TOML files in order on top of the defaults.
    pub async fn from_files(paths: &[PathBuf]) -> anyhow::Result<Self> {
        let mut merged = toml::Table::new();
        for path in paths {
            let content = fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            let table: toml::Table = toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            debug!(path = %path.display(), "Loaded config layer");
            merge_tables(&mut merged, table);
        }

        let config: Self = toml::Value::Table(merged)
            .try_into()
            .context("invalid configuration")?;
        Ok(config)
    }

    /// Apply `DESKHAND_*` environment variables.
    pub fn apply_env_overrides(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("DESKHAND_PAUSE_MS") {
            match val.trim().parse() {
                Ok(ms) => self.safety.pause_ms = ms,
                Err(_) => warn!(value = %val, "Ignoring invalid DESKHAND_PAUSE_MS"),
            }
        }
        if let Some(val) = lookup("DESKHAND_FAILSAFE") {
            match parse_bool(&val) {
                Some(b) => self.safety.failsafe = b,
                None => warn!(value = %val, "Ignoring invalid DESKHAND_FAILSAFE"),
            }
        }
        if let Some(val) = lookup("DESKHAND_CONFIDENCE") {
            match val.trim().parse() {
                Ok(c) => self.locator.confidence = c,
                Err(_) => warn!(value = %val, "Ignoring invalid DESKHAND_CONFIDENCE"),
            }
        }
        if let Some(val) = lookup("DESKHAND_STRICT_QUOTES") {
            match parse_bool(&val) {
                Some(b) => self.resolver.strict_quotes = b,
                None => warn!(value = %val, "Ignoring invalid DESKHAND_STRICT_QUOTES"),
            }
        }
    }

    /// Apply command-line flags.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(ms) = cli.pause_ms {
            self.safety.pause_ms = ms;
        }
        if cli.no_failsafe {
            self.safety.failsafe = false;
        }
        if let Some(confidence) = cli.confidence {
            self.locator.confidence = confidence;
        }
        if cli.strict_quotes {
            self.resolver.strict_quotes = true;
        }
    }

    pub fn validate(&self) -> Result<(), VisionError> {
        deskhand_vision::validate(&self.locator, &self.safety)
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = DeskhandConfig::default();
        assert!(config.safety.failsafe);
        assert_eq!(config.safety.pause_ms, 500);
        assert_eq!(config.locator.confidence, 1.0);
        assert!(!config.resolver.strict_quotes);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = DeskhandConfig::default();
        config.safety.pause_ms = 120;
        config.locator.monitor = Some(1);
        config.locator.grayscale = true;

        let text = config.to_toml().unwrap();
        let parsed: DeskhandConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[tokio::test]
    async fn test_layers_later_wins() {
        let dir = TempDir::new().unwrap();
        let global = write(
            &dir,
            "global.toml",
            "[safety]\nfailsafe = false\npause_ms = 100\n\n[locator]\nconfidence = 0.9\n",
        );
        let project = write(&dir, "project.toml", "[safety]\nfailsafe = true\n");

        let config = DeskhandConfig::from_files(&[global, project]).await.unwrap();
        assert!(config.safety.failsafe);
        assert_eq!(config.safety.pause_ms, 100);
        assert_eq!(config.locator.confidence, 0.9);
        assert!(!config.locator.grayscale);
    }

    #[tokio::test]
    async fn test_invalid_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let bad = write(&dir, "bad.toml", "[safety\n");

        let err = DeskhandConfig::from_files(&[bad]).await.unwrap_err();
        assert!(format!("{:#}", err).contains("bad.toml"));
    }

    #[tokio::test]
    async fn test_missing_explicit_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(DeskhandConfig::load(Some(&missing)).await.is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("DESKHAND_PAUSE_MS", "0"),
            ("DESKHAND_FAILSAFE", "false"),
            ("DESKHAND_CONFIDENCE", "0.8"),
            ("DESKHAND_STRICT_QUOTES", "1"),
        ]
        .into_iter()
        .collect();

        let mut config = DeskhandConfig::default();
        config.apply_env(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.safety.pause_ms, 0);
        assert!(!config.safety.failsafe);
        assert_eq!(config.locator.confidence, 0.8);
        assert!(config.resolver.strict_quotes);
    }

    #[test]
    fn test_invalid_env_values_ignored() {
        let mut config = DeskhandConfig::default();
        config.apply_env(|k| match k {
            "DESKHAND_PAUSE_MS" => Some("soon".to_string()),
            "DESKHAND_FAILSAFE" => Some("maybe".to_string()),
            _ => None,
        });
        assert_eq!(config, DeskhandConfig::default());
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "deskhand",
            "--pause-ms",
            "50",
            "--no-failsafe",
            "--confidence",
            "0.95",
            "--strict-quotes",
        ]);
        let mut config = DeskhandConfig::default();
        config.apply_cli(&cli);

        assert_eq!(config.safety.pause_ms, 50);
        assert!(!config.safety.failsafe);
        assert_eq!(config.locator.confidence, 0.95);
        assert!(config.resolver.strict_quotes);
    }

    #[test]
    fn test_validate_rejects_confidence() {
        for confidence in [0.0, -0.5, 1.5] {
            let mut config = DeskhandConfig::default();
            config.locator.confidence = confidence;
            assert!(config.validate().is_err(), "{}", confidence);
        }
    }
}
