//! Configuration for screen location and input safety.
//!
//! This module provides configuration structures for:
//! - Template matching (confidence threshold, grayscale, monitor selection)
//! - Safety controls (fail-safe corner abort, pause between actions)

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default confidence a template match must reach to count as found.
/// `1.0` accepts only pixel-exact matches.
pub const DEFAULT_CONFIDENCE: f32 = 1.0;

/// Default pause after every injected action (milliseconds).
pub const DEFAULT_PAUSE_MS: u64 = 500;

/// Template matching settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Minimum match confidence in (0, 1]. 1.0 means pixel-exact.
    pub confidence: f32,
    /// Match on luma only instead of per RGB channel
    pub grayscale: bool,
    /// Monitor index to capture; the primary monitor when unset
    pub monitor: Option<u32>,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            confidence: DEFAULT_CONFIDENCE,
            grayscale: false,
            monitor: None,
        }
    }
}

impl LocatorConfig {
    /// Set the confidence threshold.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Enable or disable grayscale matching.
    pub fn with_grayscale(mut self, grayscale: bool) -> Self {
        self.grayscale = grayscale;
        self
    }
}

/// Safety controls applied around every injected action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Abort when the pointer sits in a screen corner
    pub failsafe: bool,
    /// Delay after each injected action (milliseconds)
    pub pause_ms: u64,
    /// How close to a corner (pixels) still counts as the corner
    pub corner_tolerance: u32,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            failsafe: true,
            pause_ms: DEFAULT_PAUSE_MS,
            corner_tolerance: 0,
        }
    }
}

impl SafetyConfig {
    /// Configuration with no pause and no fail-safe, for tests and dry runs.
    pub fn disabled() -> Self {
        Self {
            failsafe: false,
            pause_ms: 0,
            corner_tolerance: 0,
        }
    }

    /// The pause as a `Duration`.
    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    /// Set the pause between actions.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause_ms = pause.as_millis() as u64;
        self
    }

    /// Enable or disable the fail-safe.
    pub fn with_failsafe(mut self, failsafe: bool) -> Self {
        self.failsafe = failsafe;
        self
    }
}

/// Validate locator settings.
pub fn validate_locator(config: &LocatorConfig) -> Result<(), ConfigError> {
    if !(config.confidence > 0.0 && config.confidence <= 1.0) {
        return Err(ConfigError::InvalidValue(format!(
            "confidence must be in (0, 1], got {}",
            config.confidence
        )));
    }
    Ok(())
}

/// Validate safety settings.
pub fn validate_safety(config: &SafetyConfig) -> Result<(), ConfigError> {
    if !config.failsafe {
        tracing::warn!("Fail-safe corner abort is disabled");
    }
    if config.corner_tolerance > 100 {
        return Err(ConfigError::InvalidValue(format!(
            "corner_tolerance must be at most 100 pixels, got {}",
            config.corner_tolerance
        )));
    }
    Ok(())
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}
