//! Screen capture and monitor geometry.
//!
//! This module provides:
//! - Platform-abstracted screen capture via the `ScreenCapture` trait
//! - Monitor geometry queries (used to fix the valid coordinate space at startup)
//! - Mapping from captured-image pixels to global desktop coordinates

use async_trait::async_trait;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during screen capture.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Screen capture not available on this platform")]
    NotAvailable,

    #[error("Failed to capture screen: {0}")]
    CaptureFailed(String),

    #[error("Monitor not found: {0}")]
    MonitorNotFound(u32),
}

/// Result type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// A rectangular region on the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// X coordinate of the top-left corner
    pub x: i32,
    /// Y coordinate of the top-left corner
    pub y: i32,
    /// Width of the region
    pub width: u32,
    /// Height of the region
    pub height: u32,
}

impl Region {
    /// Create a new region.
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Check if this region is valid (has positive dimensions).
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Check if a point is within this region.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x
            && x < self.x + self.width as i32
            && y >= self.y
            && y < self.y + self.height as i32
    }

    /// Get the center point of this region.
    pub fn center(&self) -> (i32, i32) {
        (
            self.x + (self.width / 2) as i32,
            self.y + (self.height / 2) as i32,
        )
    }

    /// The four corner pixels, clockwise from top-left.
    pub fn corners(&self) -> [(i32, i32); 4] {
        let right = self.x + self.width.saturating_sub(1) as i32;
        let bottom = self.y + self.height.saturating_sub(1) as i32;
        [
            (self.x, self.y),
            (right, self.y),
            (right, bottom),
            (self.x, bottom),
        ]
    }
}

/// Information about a display monitor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorInfo {
    /// Monitor index (0-based)
    pub index: u32,
    /// Monitor name/identifier
    pub name: String,
    /// Whether this is the primary monitor
    pub is_primary: bool,
    /// Monitor region in logical desktop coordinates
    pub region: Region,
    /// Scale factor (for HiDPI displays)
    pub scale_factor: f64,
}

/// A captured screenshot.
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// The captured image
    pub image: DynamicImage,
    /// Logical desktop region the image covers
    pub region: Region,
    /// Timestamp of capture (Unix milliseconds)
    pub timestamp: i64,
    /// Source of the capture (monitor name)
    pub source: String,
}

impl Screenshot {
    /// Create a new screenshot from an image.
    pub fn new(image: DynamicImage, region: Region, source: impl Into<String>) -> Self {
        Self {
            image,
            region,
            timestamp: chrono::Utc::now().timestamp_millis(),
            source: source.into(),
        }
    }

    /// Get the width of the screenshot in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Get the height of the screenshot in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Map a pixel of the captured image to global desktop coordinates.
    ///
    /// HiDPI captures are larger than the logical region they cover, so the
    /// pixel is scaled down before the region origin is added.
    pub fn to_screen(&self, px: u32, py: u32) -> (i32, i32) {
        let sx = if self.width() == 0 {
            0
        } else {
            (px as u64 * self.region.width as u64 / self.width() as u64) as i32
        };
        let sy = if self.height() == 0 {
            0
        } else {
            (py as u64 * self.region.height as u64 / self.height() as u64) as i32
        };
        (self.region.x + sx, self.region.y + sy)
    }
}

/// Trait for platform-specific screen capture implementations.
#[async_trait]
pub trait ScreenCapture: Send + Sync {
    /// Check if screen capture is available on this platform.
    fn is_available(&self) -> bool;

    /// Get a list of all monitors.
    async fn get_monitors(&self) -> CaptureResult<Vec<MonitorInfo>>;

    /// Capture a specific monitor.
    async fn capture_monitor(&self, monitor_index: u32) -> CaptureResult<Screenshot>;

    /// Get the primary monitor, falling back to the first one listed.
    async fn get_primary_monitor(&self) -> CaptureResult<MonitorInfo> {
        let monitors = self.get_monitors().await?;
        let fallback = monitors.first().cloned();
        monitors
            .into_iter()
            .find(|m| m.is_primary)
            .or(fallback)
            .ok_or(CaptureError::MonitorNotFound(0))
    }

    /// Capture the primary monitor.
    async fn capture_primary(&self) -> CaptureResult<Screenshot> {
        let primary = self.get_primary_monitor().await?;
        self.capture_monitor(primary.index).await
    }
}

/// Platform-specific screen capture implementation using xcap.
#[cfg(feature = "gui-automation")]
pub mod platform {
    use super::*;
    use std::time::Instant;
    use tracing::debug;

    /// Cross-platform screen capture implementation using xcap.
    #[derive(Debug, Default)]
    pub struct XcapCapture;

    impl XcapCapture {
        /// Create a new xcap-based capture implementation.
        pub fn new() -> Self {
            Self
        }

        fn monitor_to_info(monitor: &xcap::Monitor, index: u32) -> MonitorInfo {
            let name = monitor.name().unwrap_or_else(|_| format!("Monitor {}", index));
            let is_primary = monitor.is_primary().unwrap_or(index == 0);
            let x = monitor.x().unwrap_or(0);
            let y = monitor.y().unwrap_or(0);
            let width = monitor.width().unwrap_or(0);
            let height = monitor.height().unwrap_or(0);
            let scale_factor = monitor.scale_factor().unwrap_or(1.0) as f64;

            MonitorInfo {
                index,
                name,
                is_primary,
                region: Region::new(x, y, width, height),
                scale_factor,
            }
        }
    }

    #[async_trait]
    impl ScreenCapture for XcapCapture {
        fn is_available(&self) -> bool {
            xcap::Monitor::all().is_ok()
        }

        async fn get_monitors(&self) -> CaptureResult<Vec<MonitorInfo>> {
            let monitors = xcap::Monitor::all()
                .map_err(|e| CaptureError::CaptureFailed(e.to_string()))?;

            Ok(monitors
                .iter()
                .enumerate()
                .map(|(i, m)| Self::monitor_to_info(m, i as u32))
                .collect())
        }

        async fn capture_monitor(&self, monitor_index: u32) -> CaptureResult<Screenshot> {
            let start = Instant::now();

            let monitors = xcap::Monitor::all()
                .map_err(|e| CaptureError::CaptureFailed(e.to_string()))?;

            let monitor = monitors
                .into_iter()
                .nth(monitor_index as usize)
                .ok_or(CaptureError::MonitorNotFound(monitor_index))?;

            let info = Self::monitor_to_info(&monitor, monitor_index);

            let capture = monitor
                .capture_image()
                .map_err(|e| CaptureError::CaptureFailed(e.to_string()))?;

            let mut region = info.region;
            if !region.is_valid() {
                region.width = capture.width();
                region.height = capture.height();
            }

            debug!(
                monitor = monitor_index,
                width = capture.width(),
                height = capture.height(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Captured monitor"
            );

            Ok(Screenshot::new(
                DynamicImage::ImageRgba8(capture),
                region,
                info.name,
            ))
        }
    }
}

/// Create the default screen capture implementation for the current platform.
#[cfg(feature = "gui-automation")]
pub fn create_screen_capture() -> impl ScreenCapture {
    platform::XcapCapture::new()
}

#[cfg(not(feature = "gui-automation"))]
pub fn create_screen_capture() -> impl ScreenCapture {
    mock::MockCapture::unavailable()
}

/// Fixed-image screen capture for tests and headless use.
/// Always available, even when gui-automation is enabled.
pub mod mock {
    use super::*;

    /// Serves one fixed screenshot, or reports capture as unavailable.
    pub struct MockCapture {
        screen: Option<(DynamicImage, Region)>,
    }

    impl MockCapture {
        /// A single monitor at the origin showing `image`.
        pub fn new(image: DynamicImage) -> Self {
            let region = Region::new(0, 0, image.width(), image.height());
            Self::at(image, region)
        }

        /// A single monitor covering `region` showing `image`.
        pub fn at(image: DynamicImage, region: Region) -> Self {
            Self {
                screen: Some((image, region)),
            }
        }

        /// A capture backend that fails every call.
        pub fn unavailable() -> Self {
            Self { screen: None }
        }
    }

    #[async_trait]
    impl ScreenCapture for MockCapture {
        fn is_available(&self) -> bool {
            self.screen.is_some()
        }

        async fn get_monitors(&self) -> CaptureResult<Vec<MonitorInfo>> {
            let (_, region) = self.screen.as_ref().ok_or(CaptureError::NotAvailable)?;
            Ok(vec![MonitorInfo {
                index: 0,
                name: "mock".to_string(),
                is_primary: true,
                region: *region,
                scale_factor: 1.0,
            }])
        }

        async fn capture_monitor(&self, monitor_index: u32) -> CaptureResult<Screenshot> {
            let (image, region) = self.screen.as_ref().ok_or(CaptureError::NotAvailable)?;
            if monitor_index != 0 {
                return Err(CaptureError::MonitorNotFound(monitor_index));
            }
            Ok(Screenshot::new(image.clone(), *region, "mock"))
        }
    }
}
