//! # Locate Command
//!
//! Find a reference image on screen and print its centre.

use crate::config::DeskhandConfig;
use deskhand_vision::{create_screen_capture, ScreenCapture, ScreenLocator};
use std::path::Path;
use tracing::error;

/// Locate `image` and print the point, or `not found` on a miss or error.
async fn locate_with<C: ScreenCapture>(locator: &ScreenLocator<C>, image: &Path) -> bool {
    let target = image.to_string_lossy();

    match locator.try_locate(&target).await {
        Ok(Some(point)) => {
            println!("{}", point);
            true
        }
        Ok(None) => {
            println!("not found");
            false
        }
        Err(e) => {
            error!(image = %target, error = %e, "Error finding target on screen");
            println!("not found");
            false
        }
    }
}

/// Run the locate command. Returns whether the image was found.
pub async fn run(image: &Path, config: &DeskhandConfig) -> anyhow::Result<bool> {
    let locator = ScreenLocator::new(create_screen_capture(), &config.locator);
    Ok(locate_with(&locator, image).await)
}
