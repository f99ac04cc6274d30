//! Locating a reference image on screen.
//!
//! The matcher slides the template over the capture and scores every offset
//! by its sum of squared errors, normalised into a confidence in `[0, 1]`
//! where `1.0` is a pixel-exact match. The default threshold is `1.0`.
//!
//! Scoring runs once on luma with imageproc's parallel matcher. In colour
//! mode that pass only selects candidates, and each candidate is then
//! scored per RGB channel. The best-scoring offset that reaches the
//! threshold wins (ties go to the first in row-major order), and its centre
//! is reported in desktop coordinates.

use crate::capture::{CaptureError, Region, ScreenCapture};
use crate::config::LocatorConfig;
use async_trait::async_trait;
use image::{DynamicImage, RgbImage};
use imageproc::template_matching::{find_extremes, match_template_parallel, MatchTemplateMethod};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error};

/// Errors that can occur while locating a target.
#[derive(Error, Debug)]
pub enum LocateError {
    #[error("Failed to load reference image {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Reference image has zero width or height")]
    EmptyTemplate,

    #[error("Screen capture failed: {0}")]
    Capture(#[from] CaptureError),
}

/// Result type for locate operations.
pub type LocateResult<T> = Result<T, LocateError>;

/// A point in global desktop coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for ScreenPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A template hit in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateMatch {
    pub region: Region,
    pub confidence: f64,
}

/// Luma truncation error per pixel, normalised like a confidence.
const LUMA_ROUNDING: f64 = 2.0 / (255.0 * 255.0);

/// Lowest luma confidence an offset can have and still reach `threshold`
/// in colour. Luma error is at most 6x the RGB error plus rounding.
fn luma_gate(threshold: f64) -> f64 {
    if threshold >= 1.0 {
        1.0
    } else {
        1.0 - 6.0 * (1.0 - threshold) - LUMA_ROUNDING
    }
}

/// Colour SSE of `needle` at `(ox, oy)`, or None once it exceeds `limit`.
fn rgb_sse(haystack: &RgbImage, needle: &RgbImage, ox: u32, oy: u32, limit: f64) -> Option<f64> {
    let mut sse = 0.0;
    for (x, y, n) in needle.enumerate_pixels() {
        let h = haystack.get_pixel(ox + x, oy + y);
        for c in 0..3 {
            let d = h[c] as f64 - n[c] as f64;
            sse += d * d;
        }
        if sse > limit {
            return None;
        }
    }
    Some(sse)
}

/// Sum-of-squared-errors template matcher.
#[derive(Debug, Clone)]
pub struct TemplateMatcher {
    confidence: f32,
    grayscale: bool,
}

impl Default for TemplateMatcher {
    fn default() -> Self {
        Self::new(&LocatorConfig::default())
    }
}

impl TemplateMatcher {
    pub fn new(config: &LocatorConfig) -> Self {
        Self {
            confidence: config.confidence,
            grayscale: config.grayscale,
        }
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Find the best offset where `needle` matches `haystack`.
    pub fn find_best(
        &self,
        haystack: &DynamicImage,
        needle: &DynamicImage,
    ) -> LocateResult<Option<TemplateMatch>> {
        let (tw, th) = (needle.width(), needle.height());
        let (hw, hh) = (haystack.width(), haystack.height());

        if tw == 0 || th == 0 {
            return Err(LocateError::EmptyTemplate);
        }
        if tw > hw || th > hh {
            debug!(tw, th, hw, hh, "Template larger than screen");
            return Ok(None);
        }

        let scores = match_template_parallel(
            &haystack.to_luma8(),
            &needle.to_luma8(),
            MatchTemplateMethod::SumOfSquaredErrors,
        );

        let pixels = tw as f64 * th as f64;
        let max_luma = pixels * 255.0 * 255.0;
        let threshold = self.confidence as f64;
        let region = |x: u32, y: u32| Region::new(x as i32, y as i32, tw, th);

        if self.grayscale {
            let extremes = find_extremes(&scores);
            let (x, y) = extremes.min_value_location;
            let confidence = 1.0 - extremes.min_value as f64 / max_luma;
            return Ok((confidence >= threshold).then(|| TemplateMatch {
                region: region(x, y),
                confidence,
            }));
        }

        let hay_rgb = haystack.to_rgb8();
        let needle_rgb = needle.to_rgb8();
        let max_rgb = 3.0 * max_luma;
        let gate = luma_gate(threshold);

        let mut limit = (1.0 - threshold).max(0.0) * max_rgb;
        let mut best: Option<(u32, u32, f64)> = None;
        for (x, y, score) in scores.enumerate_pixels() {
            if 1.0 - score[0] as f64 / max_luma < gate {
                continue;
            }
            let Some(sse) = rgb_sse(&hay_rgb, &needle_rgb, x, y, limit) else {
                continue;
            };
            if best.is_some() && sse >= limit {
                continue;
            }
            best = Some((x, y, sse));
            limit = sse;
            if sse == 0.0 {
                break;
            }
        }

        Ok(best.map(|(x, y, sse)| TemplateMatch {
            region: region(x, y),
            confidence: 1.0 - sse / max_rgb,
        }))
    }
}

/// Anything that can turn a target descriptor into a point on screen.
#[async_trait]
pub trait TargetLocator: Send + Sync {
    /// Locate `target`, or None when it is not on screen. Never fails.
    async fn locate(&self, target: &str) -> Option<ScreenPoint>;
}

/// Locates reference images in live screen captures.
pub struct ScreenLocator<C: ScreenCapture> {
    capture: C,
    matcher: TemplateMatcher,
    monitor: Option<u32>,
}

impl<C: ScreenCapture> ScreenLocator<C> {
    pub fn new(capture: C, config: &LocatorConfig) -> Self {
        Self {
            capture,
            matcher: TemplateMatcher::new(config),
            monitor: config.monitor,
        }
    }

    pub fn capture(&self) -> &C {
        &self.capture
    }

    /// Locate the reference image at `target`, surfacing every failure.
    pub async fn try_locate(&self, target: &str) -> LocateResult<Option<ScreenPoint>> {
        let path = Path::new(target);
        let template = image::open(path).map_err(|source| LocateError::Template {
            path: path.to_path_buf(),
            source,
        })?;

        let screenshot = match self.monitor {
            Some(index) => self.capture.capture_monitor(index).await?,
            None => self.capture.capture_primary().await?,
        };

        let start = Instant::now();
        let hit = self.matcher.find_best(&screenshot.image, &template)?;
        debug!(
            descriptor = target,
            found = hit.is_some(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Template match finished"
        );

        Ok(hit.map(|m| {
            let (cx, cy) = m.region.center();
            let (x, y) = screenshot.to_screen(cx as u32, cy as u32);
            ScreenPoint::new(x, y)
        }))
    }
}

#[async_trait]
impl<C: ScreenCapture> TargetLocator for ScreenLocator<C> {
    async fn locate(&self, target: &str) -> Option<ScreenPoint> {
        match self.try_locate(target).await {
            Ok(point) => point,
            Err(e) => {
                error!(descriptor = target, error = %e, "Error finding target on screen");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::mock::MockCapture;
    use image::{Rgb, RgbImage};

    /// White screen with a 4x4 red square at (10, 6) and a blue pixel inside it.
    fn screen() -> DynamicImage {
        let mut img = RgbImage::from_pixel(32, 24, Rgb([255, 255, 255]));
        for y in 6..10 {
            for x in 10..14 {
                img.put_pixel(x, y, Rgb([255, 0, 0]));
            }
        }
        img.put_pixel(11, 7, Rgb([0, 0, 255]));
        DynamicImage::ImageRgb8(img)
    }

    fn crop(image: &DynamicImage, x: u32, y: u32, w: u32, h: u32) -> DynamicImage {
        image.crop_imm(x, y, w, h)
    }

    #[test]
    fn test_exact_match() {
        let screen = screen();
        let needle = crop(&screen, 10, 6, 4, 4);
        let hit = TemplateMatcher::default()
            .find_best(&screen, &needle)
            .unwrap()
            .unwrap();
        assert_eq!(hit.region, Region::new(10, 6, 4, 4));
        assert!((hit.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_first_match_in_scan_order() {
        // A white template matches the top-left corner first.
        let screen = screen();
        let needle = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 3, Rgb([255, 255, 255])));
        let hit = TemplateMatcher::default()
            .find_best(&screen, &needle)
            .unwrap()
            .unwrap();
        assert_eq!((hit.region.x, hit.region.y), (0, 0));
    }

    #[test]
    fn test_absent_template() {
        let screen = screen();
        let needle = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([0, 255, 0])));
        let hit = TemplateMatcher::default().find_best(&screen, &needle).unwrap();
        assert!(hit.is_none());
    }

    #[test]
    fn test_color_mismatch_rejected() {
        // Recolouring the square from red to blue must not match.
        let screen = screen();
        let mut swapped = crop(&screen, 10, 6, 4, 4).to_rgb8();
        for pixel in swapped.pixels_mut() {
            if *pixel == Rgb([255, 0, 0]) {
                *pixel = Rgb([0, 0, 255]);
            }
        }
        let needle = DynamicImage::ImageRgb8(swapped);
        let color = TemplateMatcher::default();
        assert!(color.find_best(&screen, &needle).unwrap().is_none());
    }

    #[test]
    fn test_grayscale_match() {
        let screen = screen();
        let needle = crop(&screen, 9, 5, 6, 6);
        let matcher = TemplateMatcher::new(&LocatorConfig::default().with_grayscale(true));
        let hit = matcher.find_best(&screen, &needle).unwrap().unwrap();
        assert_eq!(hit.region, Region::new(9, 5, 6, 6));
    }

    #[test]
    fn test_template_larger_than_screen() {
        let screen = screen();
        let needle = DynamicImage::ImageRgb8(RgbImage::new(64, 64));
        assert!(TemplateMatcher::default()
            .find_best(&screen, &needle)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_empty_template() {
        let screen = screen();
        let needle = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert!(matches!(
            TemplateMatcher::default().find_best(&screen, &needle),
            Err(LocateError::EmptyTemplate)
        ));
    }

    #[test]
    fn test_default_requires_exact_match() {
        let screen = screen();
        let mut noisy = crop(&screen, 10, 6, 4, 4).to_rgb8();
        noisy.put_pixel(0, 0, Rgb([250, 5, 5]));
        let needle = DynamicImage::ImageRgb8(noisy);

        assert!(TemplateMatcher::default()
            .find_best(&screen, &needle)
            .unwrap()
            .is_none());

        let lenient = TemplateMatcher::new(&LocatorConfig::default().with_confidence(0.999));
        let hit = lenient.find_best(&screen, &needle).unwrap().unwrap();
        assert_eq!(hit.region, Region::new(10, 6, 4, 4));
        assert!(hit.confidence < 1.0);
    }

    /// White screen with a (200,200,200) square at (10, 10) and a
    /// (205,205,205) square at (100, 100), both 20x20.
    fn near_shades() -> DynamicImage {
        let mut img = RgbImage::from_pixel(200, 200, Rgb([255, 255, 255]));
        for (origin, shade) in [(10, 200u8), (100, 205u8)] {
            for y in origin..origin + 20 {
                for x in origin..origin + 20 {
                    img.put_pixel(x, y, Rgb([shade, shade, shade]));
                }
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_near_shade_earlier_in_scan_order_is_skipped() {
        let screen = near_shades();
        let needle = crop(&screen, 100, 100, 20, 20);

        let hit = TemplateMatcher::default()
            .find_best(&screen, &needle)
            .unwrap()
            .unwrap();
        assert_eq!(hit.region, Region::new(100, 100, 20, 20));
        assert_eq!(hit.confidence, 1.0);
    }

    #[test]
    fn test_lenient_threshold_prefers_best_score() {
        let screen = near_shades();
        let needle = crop(&screen, 100, 100, 20, 20);

        for grayscale in [false, true] {
            let config = LocatorConfig::default()
                .with_confidence(0.99)
                .with_grayscale(grayscale);
            let hit = TemplateMatcher::new(&config)
                .find_best(&screen, &needle)
                .unwrap()
                .unwrap();
            assert_eq!(hit.region, Region::new(100, 100, 20, 20), "{}", grayscale);
        }
    }

    #[test]
    fn test_lenient_threshold_accepts_near_shade_alone() {
        // Only the darker square is on screen; 0.99 still finds it.
        let mut img = RgbImage::from_pixel(60, 60, Rgb([255, 255, 255]));
        for y in 10..30 {
            for x in 10..30 {
                img.put_pixel(x, y, Rgb([200, 200, 200]));
            }
        }
        let screen = DynamicImage::ImageRgb8(img);
        let needle = DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 20, Rgb([205, 205, 205])));

        assert!(TemplateMatcher::default()
            .find_best(&screen, &needle)
            .unwrap()
            .is_none());

        let lenient = TemplateMatcher::new(&LocatorConfig::default().with_confidence(0.99));
        let hit = lenient.find_best(&screen, &needle).unwrap().unwrap();
        assert_eq!(hit.region, Region::new(10, 10, 20, 20));
    }

    #[test]
    fn test_luma_gate_never_exceeds_threshold() {
        assert_eq!(luma_gate(1.0), 1.0);
        for t in [0.5, 0.9, 0.99, 0.999] {
            assert!(luma_gate(t) < t);
        }
    }

    #[tokio::test]
    async fn test_screen_locator_centroid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.png");
        let screen = screen();
        crop(&screen, 10, 6, 4, 4).save(&path).unwrap();

        let capture = MockCapture::at(screen, Region::new(100, 50, 32, 24));
        let locator = ScreenLocator::new(capture, &LocatorConfig::default());
        let point = locator.locate(path.to_str().unwrap()).await;
        assert_eq!(point, Some(ScreenPoint::new(112, 58)));
    }

    #[tokio::test]
    async fn test_screen_locator_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("green.png");
        RgbImage::from_pixel(4, 4, Rgb([0, 255, 0])).save(&path).unwrap();

        let locator = ScreenLocator::new(MockCapture::new(screen()), &LocatorConfig::default());
        assert_eq!(locator.locate(path.to_str().unwrap()).await, None);
    }

    #[tokio::test]
    async fn test_screen_locator_swallows_errors() {
        let locator = ScreenLocator::new(MockCapture::new(screen()), &LocatorConfig::default());
        assert_eq!(locator.locate("/definitely/not/here.png").await, None);
        assert!(matches!(
            locator.try_locate("/definitely/not/here.png").await,
            Err(LocateError::Template { .. })
        ));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("any.png");
        RgbImage::new(2, 2).save(&path).unwrap();
        let blind = ScreenLocator::new(MockCapture::unavailable(), &LocatorConfig::default());
        assert_eq!(blind.locate(path.to_str().unwrap()).await, None);
    }
}
