//! Configuration for solanum-eye

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default model confidence, matching the detection page slider default of 40%
pub const DEFAULT_CONFIDENCE: f32 = 0.40;

/// Lowest value offered by the confidence slider, in percent
pub const MIN_CONFIDENCE_PERCENT: u32 = 25;

/// Vision pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EyeConfig {
    /// Model confidence threshold in (0, 1]
    pub confidence: f32,
    /// USB camera device index used by the webcam source
    pub camera_id: u32,
    /// Target frames per second of the streaming loop. 0 runs unpaced.
    pub frame_rate: u32,
    /// Capture resolution requested from cameras (width, height)
    pub resolution: (u32, u32),
    /// Size frames from continuous sources are scaled to before detection
    pub frame_size: Option<(u32, u32)>,
    /// Optional TTF/OTF font used to print class labels on annotated frames
    pub label_font: Option<PathBuf>,
    /// Program used to resolve remote video URLs into stream URLs
    pub resolver_program: String,
}

impl Default for EyeConfig {
    fn default() -> Self {
        Self {
            confidence: DEFAULT_CONFIDENCE,
            camera_id: 0,
            frame_rate: 30,
            resolution: (640, 480),
            frame_size: Some((720, 405)),
            label_font: None,
            resolver_program: "yt-dlp".to_string(),
        }
    }
}

impl EyeConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        validate_confidence(self.confidence)?;

        if self.frame_rate > 120 {
            return Err("Frame rate must be between 0 and 120".to_string());
        }

        check_size("Resolution", self.resolution)?;
        if let Some(size) = self.frame_size {
            check_size("Frame size", size)?;
        }

        if self.camera_id > 100 {
            return Err("Camera ID too large (max 100)".to_string());
        }

        if self.resolver_program.trim().is_empty() {
            return Err("Resolver program must not be empty".to_string());
        }

        Ok(())
    }
}

/// Confidence thresholds are accepted in (0, 1]
pub fn validate_confidence(confidence: f32) -> Result<f32, String> {
    if confidence.is_nan() || confidence <= 0.0 || confidence > 1.0 {
        return Err(format!("Confidence must be in (0, 1], got {}", confidence));
    }
    Ok(confidence)
}

/// Convert a slider percentage (25..=100) into a confidence threshold
pub fn confidence_from_percent(percent: u32) -> Result<f32, String> {
    if !(MIN_CONFIDENCE_PERCENT..=100).contains(&percent) {
        return Err(format!(
            "Confidence percent must be between {} and 100, got {}",
            MIN_CONFIDENCE_PERCENT, percent
        ));
    }
    Ok(percent as f32 / 100.0)
}

fn check_size(what: &str, (width, height): (u32, u32)) -> Result<(), String> {
    if width == 0 || height == 0 {
        return Err(format!("{} must be non-zero", what));
    }
    if width > 7680 || height > 4320 {
        return Err(format!("{} too large (max 8K)", what));
    }
    Ok(())
}
