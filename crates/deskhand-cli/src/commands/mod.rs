//! # CLI Commands
//!
//! Subcommand implementations for the Deskhand CLI.

pub mod config;
pub mod locate;
pub mod monitors;
pub mod run;

use crate::config::DeskhandConfig;
use deskhand_core::{Assistant, InputSimulator, Region};
use deskhand_vision::input::mock::MockSimulator;
use deskhand_vision::{create_input_simulator, create_screen_capture, ScreenCapture, ScreenLocator};
use std::sync::Arc;
use tracing::{debug, warn};

/// Bounds of the configured monitor, or the primary one.
async fn monitor_bounds<C: ScreenCapture>(capture: &C, monitor: Option<u32>) -> Option<Region> {
    let info = match monitor {
        Some(index) => capture.get_monitors().await.and_then(|monitors| {
            monitors
                .into_iter()
                .find(|m| m.index == index)
                .ok_or(deskhand_vision::CaptureError::MonitorNotFound(index))
        }),
        None => capture.get_primary_monitor().await,
    };

    match info {
        Ok(info) => {
            debug!(monitor = info.index, name = %info.name, "Using monitor bounds");
            Some(info.region)
        }
        Err(e) => {
            warn!(error = %e, "Monitor geometry unavailable, bounds checks disabled");
            None
        }
    }
}

/// Wire up the resolve, locate and execute pipeline.
pub async fn assistant(config: &DeskhandConfig, dry_run: bool) -> anyhow::Result<Assistant> {
    let capture = create_screen_capture();
    let bounds = monitor_bounds(&capture, config.locator.monitor).await;

    let input: Arc<dyn InputSimulator> = if dry_run {
        // Park the simulated pointer away from every fail-safe corner.
        let (x, y) = bounds.map(|b| b.center()).unwrap_or_else(|| {
            let offset = config.safety.corner_tolerance as i32 + 1;
            (offset, offset)
        });
        Arc::new(MockSimulator::at(x, y))
    } else {
        Arc::new(create_input_simulator()?)
    };

    let assistant = Assistant::builder()
        .resolver(config.resolver.clone())
        .safety(config.safety.clone())
        .bounds(bounds)
        .input(input)
        .locator(Arc::new(ScreenLocator::new(capture, &config.locator)))
        .build()?;
    Ok(assistant)
}
