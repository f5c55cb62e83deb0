//! High-level comparison API.
//!
//! [`Comparator`] is the primary entry point: it wraps a [`CompareConfig`]
//! and offers convenience methods for the common comparison scenarios
//! (whole images, independent crops, injected detector, external scorer).

use image::RgbaImage;

use crate::config::CompareConfig;
use crate::detector::{MapRegionDetector, RegionDetector};
use crate::pipeline::{self, CompareOutcome};
use crate::rect::Rect;
use crate::scorer::RegionScorer;
use crate::settings::{Settings, SettingsError};

/// Primary comparison interface.
///
/// Create once, compare many pairs. Each comparison is an independent,
/// side-effect-free computation.
///
/// # Examples
///
/// ```no_run
/// use spotdiff::{Comparator, Settings};
/// use image::RgbaImage;
///
/// let comparator = Comparator::new();
/// let left = RgbaImage::new(640, 480);
/// let right = RgbaImage::new(640, 480);
/// let outcome = comparator.compare(&left, &right, Settings::default()).unwrap();
/// println!("found {} regions", outcome.boxes.len());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Comparator {
    config: CompareConfig,
}

impl Comparator {
    /// Comparator with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Comparator with full config control.
    pub fn with_config(config: CompareConfig) -> Self {
        Self { config }
    }

    /// Access the current configuration.
    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    /// Mutable access for post-construction tuning.
    pub fn config_mut(&mut self) -> &mut CompareConfig {
        &mut self.config
    }

    /// Compare two whole images.
    pub fn compare(
        &self,
        left: &RgbaImage,
        right: &RgbaImage,
        settings: Settings,
    ) -> Result<CompareOutcome, SettingsError> {
        self.compare_with_crops(left, Rect::FULL, right, Rect::FULL, settings)
    }

    /// Compare two images restricted to independent normalized crops.
    pub fn compare_with_crops(
        &self,
        left: &RgbaImage,
        left_crop: Rect,
        right: &RgbaImage,
        right_crop: Rect,
        settings: Settings,
    ) -> Result<CompareOutcome, SettingsError> {
        let settings = revalidate(settings)?;
        let detector = MapRegionDetector::new(self.config.detector.clone());
        Ok(pipeline::run_compare(
            left, left_crop, right, right_crop, &settings, &self.config, &detector, None,
        ))
    }

    /// Compare with an external region scorer refining final confidences.
    pub fn compare_with_scorer(
        &self,
        left: &RgbaImage,
        right: &RgbaImage,
        settings: Settings,
        scorer: &dyn RegionScorer,
    ) -> Result<CompareOutcome, SettingsError> {
        let settings = revalidate(settings)?;
        let detector = MapRegionDetector::new(self.config.detector.clone());
        Ok(pipeline::run_compare(
            left,
            Rect::FULL,
            right,
            Rect::FULL,
            &settings,
            &self.config,
            &detector,
            Some(scorer),
        ))
    }

    /// Compare with an injected detector.
    ///
    /// Documented fast path: sampling and alignment are skipped entirely —
    /// the override receives a zeroed analysis-size map, and its boxes are
    /// remapped to full-image coordinates as usual.
    pub fn compare_with_detector(
        &self,
        left: &RgbaImage,
        left_crop: Rect,
        right: &RgbaImage,
        right_crop: Rect,
        settings: Settings,
        detector: &dyn RegionDetector,
    ) -> Result<CompareOutcome, SettingsError> {
        let settings = revalidate(settings)?;
        Ok(pipeline::run_with_override(
            left.dimensions(),
            left_crop,
            right.dimensions(),
            right_crop,
            &settings,
            &self.config,
            detector,
        ))
    }
}

/// Boundary re-validation: settings constructed through [`Settings::new`]
/// are always valid, but deserialized or default-constructed values pass
/// through here once more so the contract holds at every entry point.
fn revalidate(settings: Settings) -> Result<Settings, SettingsError> {
    Settings::new(settings.precision_level(), settings.min_area_percent())
}
