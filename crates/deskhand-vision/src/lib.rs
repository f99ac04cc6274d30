//! # Deskhand Vision
//!
//! The eyes and hands of Deskhand.
//!
//! ## Features
//!
//! - **Screen Capture**: Platform-abstracted capture and monitor geometry (xcap)
//! - **Screen Locator**: Template matching of a reference image against a capture (imageproc)
//! - **Input Injection**: Mouse clicks and typing (enigo)
//! - **Safety Controls**: Fail-safe corner abort, bounds checks, pause between actions
//!
//! The platform backends live behind the `gui-automation` feature (on by
//! default). The `mock` modules are always compiled so that other crates can
//! drive the whole pipeline against synthetic screens.
//!
//! ```rust,no_run
//! use deskhand_vision::{create_screen_capture, LocatorConfig, ScreenLocator, TargetLocator};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let locator = ScreenLocator::new(create_screen_capture(), &LocatorConfig::default());
//!     match locator.locate("assets/ok_button.png").await {
//!         Some(point) => println!("found at {}", point),
//!         None => println!("not found"),
//!     }
//! }
//! ```

pub mod capture;
pub mod config;
pub mod input;
pub mod locate;
pub mod safety;

pub use capture::{
    create_screen_capture, CaptureError, CaptureResult, MonitorInfo, Region, ScreenCapture,
    Screenshot,
};
pub use config::{ConfigError, LocatorConfig, SafetyConfig};
pub use input::{
    create_input_simulator, InputError, InputEvent, InputResult, InputSimulator,
};
pub use locate::{
    LocateError, LocateResult, ScreenLocator, ScreenPoint, TargetLocator, TemplateMatch,
    TemplateMatcher,
};
pub use safety::{SafetyError, SafetyGuard, SafetyResult};

use thiserror::Error;

/// Main error type for the vision crate.
#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Screen capture failed: {0}")]
    CaptureError(#[from] CaptureError),

    #[error("Locate failed: {0}")]
    LocateError(#[from] LocateError),

    #[error("Input error: {0}")]
    InputError(#[from] InputError),

    #[error("Safety error: {0}")]
    SafetyError(#[from] SafetyError),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),
}

/// Result type for the vision crate.
pub type Result<T> = std::result::Result<T, VisionError>;

/// Validate locator and safety settings together.
pub fn validate(locator: &LocatorConfig, safety: &SafetyConfig) -> Result<()> {
    config::validate_locator(locator)?;
    config::validate_safety(safety)?;
    Ok(())
}
