use crate::error::PrepError;
use image::{GrayImage, RgbaImage};
use serde::Serialize;
use std::time::Instant;

use super::steps;

/// Parameters for the adaptive binarization stage.
///
/// Shared read-only by the whole pipeline run; every field has the
/// documented default and is validated once, up front.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PrepConfig {
    /// Neighborhood side length for adaptive thresholding (must be odd)
    pub block_size: u32,
    /// Sauvola sensitivity constant
    pub k: f32,
    /// Expected dynamic range of the local standard deviation
    pub r: f32,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            block_size: 25,
            k: 0.3,
            r: 128.0,
        }
    }
}

impl PrepConfig {
    pub fn validate(&self) -> Result<(), PrepError> {
        if self.block_size == 0 || self.block_size % 2 == 0 {
            return Err(PrepError::InvalidConfig(format!(
                "block_size must be odd, got {}",
                self.block_size
            )));
        }
        if !self.r.is_finite() || self.r <= 0.0 {
            return Err(PrepError::InvalidConfig(format!(
                "r must be a positive finite number, got {}",
                self.r
            )));
        }
        if !self.k.is_finite() {
            return Err(PrepError::InvalidConfig(format!(
                "k must be finite, got {}",
                self.k
            )));
        }
        Ok(())
    }
}

/// Timing information for a single pipeline step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Result of a full pipeline run including timing stats
#[derive(Debug, Clone, Serialize)]
pub struct PrepResult {
    /// Final binary image (not serialized)
    #[serde(skip)]
    pub image: GrayImage,
    /// Total processing time in milliseconds
    pub total_time_ms: u64,
    /// Individual step timings
    pub steps: Vec<StepTiming>,
}

/// The fixed preprocessing pipeline.
///
/// Runs grayscale, blur, equalize, binarize, and erode strictly in that
/// order. Each step consumes the previous step's full output and produces
/// a new buffer of identical dimensions; no state survives between runs.
pub struct Pipeline {
    config: PrepConfig,
}

impl Pipeline {
    pub fn new(config: PrepConfig) -> Result<Self, PrepError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Process one decoded image through all five stages.
    pub fn process(&self, image: &RgbaImage) -> PrepResult {
        let start = Instant::now();
        let mut timings = Vec::new();

        let gray = Self::run_step("grayscale", &mut timings, || steps::grayscale::apply(image));
        let blurred = Self::run_step("blur", &mut timings, || steps::blur::apply(&gray));
        let equalized = Self::run_step("equalize", &mut timings, || steps::equalize::apply(&blurred));
        let binary = Self::run_step("binarize", &mut timings, || {
            steps::binarize::apply(&equalized, &self.config)
        });
        let eroded = Self::run_step("erode", &mut timings, || steps::erode::apply(&binary));

        PrepResult {
            image: eroded,
            total_time_ms: start.elapsed().as_millis() as u64,
            steps: timings,
        }
    }

    fn run_step<F>(name: &str, timings: &mut Vec<StepTiming>, step_fn: F) -> GrayImage
    where
        F: FnOnce() -> GrayImage,
    {
        let step_start = Instant::now();
        let result = step_fn();
        let time_ms = step_start.elapsed().as_millis() as u64;
        tracing::debug!("step {} completed in {}ms", name, time_ms);
        timings.push(StepTiming {
            name: name.to_string(),
            time_ms,
        });
        result
    }
}
