//! Input injection.
//!
//! This module provides:
//! - The `InputSimulator` trait: pointer position, left clicks and typing
//! - An enigo-backed implementation for the real desktop
//! - A recording mock used by tests and dry runs

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur during input simulation.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Input simulation not available on this platform")]
    NotAvailable,

    #[error("Failed to simulate input: {0}")]
    SimulationFailed(String),
}

/// Result type for input operations.
pub type InputResult<T> = Result<T, InputError>;

/// An injected input event, as recorded by the mock simulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    Click { x: i32, y: i32 },
    Type { text: String },
}

impl fmt::Display for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Click { x, y } => write!(f, "click {},{}", x, y),
            Self::Type { text } => write!(f, "type {}", text),
        }
    }
}

/// OS-level input injection.
#[async_trait]
pub trait InputSimulator: Send + Sync {
    /// Get the current pointer position.
    async fn mouse_position(&self) -> InputResult<(i32, i32)>;

    /// Move the pointer to absolute coordinates and left click.
    async fn click(&self, x: i32, y: i32) -> InputResult<()>;

    /// Type literal text as keystrokes.
    async fn type_text(&self, text: &str) -> InputResult<()>;
}

/// Platform-specific input simulation using enigo.
#[cfg(feature = "gui-automation")]
pub mod platform {
    use super::*;
    use enigo::{Button, Coordinate, Direction, Enigo, Keyboard, Mouse, Settings};
    use std::sync::Mutex as StdMutex;

    /// Enigo-based input simulator.
    pub struct EnigoSimulator {
        enigo: StdMutex<Enigo>,
    }

    impl EnigoSimulator {
        /// Create a new Enigo-based simulator.
        pub fn new() -> InputResult<Self> {
            let settings = Settings::default();
            let enigo =
                Enigo::new(&settings).map_err(|e| InputError::SimulationFailed(e.to_string()))?;

            Ok(Self {
                enigo: StdMutex::new(enigo),
            })
        }

        fn with_enigo<T>(
            &self,
            f: impl FnOnce(&mut Enigo) -> Result<T, enigo::InputError>,
        ) -> InputResult<T> {
            let mut enigo = self.enigo.lock().map_err(|e| {
                InputError::SimulationFailed(format!("Failed to lock enigo: {}", e))
            })?;
            f(&mut enigo).map_err(|e| InputError::SimulationFailed(e.to_string()))
        }
    }

    #[async_trait]
    impl InputSimulator for EnigoSimulator {
        async fn mouse_position(&self) -> InputResult<(i32, i32)> {
            self.with_enigo(|enigo| enigo.location())
        }

        async fn click(&self, x: i32, y: i32) -> InputResult<()> {
            self.with_enigo(|enigo| {
                enigo.move_mouse(x, y, Coordinate::Abs)?;
                enigo.button(Button::Left, Direction::Click)
            })
        }

        async fn type_text(&self, text: &str) -> InputResult<()> {
            if text.is_empty() {
                return Ok(());
            }
            self.with_enigo(|enigo| enigo.text(text))
        }
    }
}

/// Create the default input simulator for the current platform.
#[cfg(feature = "gui-automation")]
pub fn create_input_simulator() -> InputResult<impl InputSimulator> {
    platform::EnigoSimulator::new()
}

#[cfg(not(feature = "gui-automation"))]
pub fn create_input_simulator() -> InputResult<impl InputSimulator> {
    Err::<mock::MockSimulator, _>(InputError::NotAvailable)
}

/// Mock input simulator for testing and dry runs.
/// Always available, even when gui-automation is enabled.
pub mod mock {
    use super::*;
    use tokio::sync::Mutex;
    use tracing::info;

    /// Records every injected event instead of touching the OS.
    pub struct MockSimulator {
        /// Simulated pointer position
        position: Mutex<(i32, i32)>,
        /// Injected events, oldest first
        events: Mutex<Vec<InputEvent>>,
        /// Fail every injection call when set
        failing: bool,
    }

    impl MockSimulator {
        /// Create a new mock simulator with the pointer at the origin.
        pub fn new() -> Self {
            Self::at(0, 0)
        }

        /// Create a mock with the pointer at `(x, y)`.
        pub fn at(x: i32, y: i32) -> Self {
            Self {
                position: Mutex::new((x, y)),
                events: Mutex::new(Vec::new()),
                failing: false,
            }
        }

        /// Create a mock whose injection calls all fail.
        pub fn failing() -> Self {
            Self {
                failing: true,
                ..Self::new()
            }
        }

        /// Move the simulated pointer without recording an event.
        pub async fn set_position(&self, x: i32, y: i32) {
            *self.position.lock().await = (x, y);
        }

        /// All recorded events.
        pub async fn events(&self) -> Vec<InputEvent> {
            self.events.lock().await.clone()
        }

        async fn record(&self, event: InputEvent) -> InputResult<()> {
            if self.failing {
                return Err(InputError::SimulationFailed(format!(
                    "mock rejected `{}`",
                    event
                )));
            }
            info!(event = %event, "Simulated input");
            self.events.lock().await.push(event);
            Ok(())
        }
    }

    impl Default for MockSimulator {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl InputSimulator for MockSimulator {
        async fn mouse_position(&self) -> InputResult<(i32, i32)> {
            Ok(*self.position.lock().await)
        }

        async fn click(&self, x: i32, y: i32) -> InputResult<()> {
            self.record(InputEvent::Click { x, y }).await?;
            self.set_position(x, y).await;
            Ok(())
        }

        async fn type_text(&self, text: &str) -> InputResult<()> {
            self.record(InputEvent::Type {
                text: text.to_string(),
            })
            .await
        }
    }
}
