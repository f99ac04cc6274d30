//! # Monitors Command
//!
//! List monitor geometry as seen by the capture backend.

use colored::Colorize;
use deskhand_vision::{create_screen_capture, ScreenCapture};

/// Run the monitors command
pub async fn run() -> anyhow::Result<()> {
    let capture = create_screen_capture();
    if !capture.is_available() {
        anyhow::bail!("screen capture is not available on this system");
    }

    let monitors = capture.get_monitors().await?;
    if monitors.is_empty() {
        println!("No monitors found");
        return Ok(());
    }

    for m in monitors {
        let marker = if m.is_primary {
            " (primary)".bright_green().to_string()
        } else {
            String::new()
        };
        println!(
            "{} {}{}  {}x{}+{}+{}  scale {:.2}",
            format!("[{}]", m.index).bright_cyan(),
            m.name.bold(),
            marker,
            m.region.width,
            m.region.height,
            m.region.x,
            m.region.y,
            m.scale_factor
        );
    }
    Ok(())
}
