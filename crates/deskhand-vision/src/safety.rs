//! Safety controls around input injection.
//!
//! - Fail-safe: a pointer parked in a screen corner aborts the pending action
//! - Bounds: injected coordinates must fall inside the monitor captured at startup

use crate::capture::Region;
use crate::config::SafetyConfig;
use crate::input::{InputError, InputSimulator};
use thiserror::Error;
use tracing::warn;

/// Errors related to safety controls.
#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Fail-safe triggered: pointer at screen corner ({0}, {1})")]
    FailSafeTriggered(i32, i32),

    #[error("Point ({0}, {1}) is outside the screen bounds")]
    OutOfBounds(i32, i32),

    #[error("Pointer query failed: {0}")]
    Input(#[from] InputError),
}

/// Result type for safety operations.
pub type SafetyResult<T> = Result<T, SafetyError>;

/// Checks the fail-safe and screen bounds before each injected action.
#[derive(Debug, Clone)]
pub struct SafetyGuard {
    config: SafetyConfig,
    bounds: Option<Region>,
}

impl SafetyGuard {
    /// Create a guard for the given monitor bounds (None when unknown).
    pub fn new(config: SafetyConfig, bounds: Option<Region>) -> Self {
        Self { config, bounds }
    }

    pub fn config(&self) -> &SafetyConfig {
        &self.config
    }

    pub fn bounds(&self) -> Option<Region> {
        self.bounds
    }

    /// Whether `(x, y)` counts as a fail-safe corner.
    ///
    /// Without known bounds only the desktop origin qualifies.
    pub fn is_failsafe_point(&self, x: i32, y: i32) -> bool {
        let tolerance = self.config.corner_tolerance as i32;
        let near = |(cx, cy): (i32, i32)| (x - cx).abs() <= tolerance && (y - cy).abs() <= tolerance;

        match self.bounds {
            Some(bounds) => bounds.corners().into_iter().any(near),
            None => near((0, 0)),
        }
    }

    /// Abort if the fail-safe is enabled and the pointer sits in a corner.
    pub async fn check_failsafe<S: InputSimulator + ?Sized>(&self, input: &S) -> SafetyResult<()> {
        if !self.config.failsafe {
            return Ok(());
        }

        let (x, y) = input.mouse_position().await?;
        if self.is_failsafe_point(x, y) {
            warn!(x, y, "Fail-safe corner reached, aborting action");
            return Err(SafetyError::FailSafeTriggered(x, y));
        }
        Ok(())
    }

    /// Reject points outside the startup monitor bounds.
    pub fn check_bounds(&self, x: i32, y: i32) -> SafetyResult<()> {
        match self.bounds {
            Some(bounds) if !bounds.contains(x, y) => Err(SafetyError::OutOfBounds(x, y)),
            _ => Ok(()),
        }
    }

    /// Sleep for the configured pause after an action.
    pub async fn pause(&self) {
        let pause = self.config.pause();
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }
}
