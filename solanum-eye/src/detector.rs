//! Detector: model inference plus annotation for one frame

use crate::annotate::Annotator;
use crate::config::validate_confidence;
use crate::frame::{encode_png, Frame};
use crate::models::Model;
use image::RgbImage;
use solanum_core::{Detection, Error, Result};
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of running the detector on one frame
#[derive(Debug, Clone)]
pub struct Inference {
    pub annotated: RgbImage,
    pub detections: Vec<Detection>,
    pub frame_index: u64,
}

impl Inference {
    /// One line per detection, as shown in the results panel
    pub fn summary(&self) -> Vec<String> {
        if self.detections.is_empty() {
            return vec!["No objects detected.".to_string()];
        }
        self.detections
            .iter()
            .map(|d| format!("Class: {}, Confidence: {:.2}", d.class_name, d.confidence))
            .collect()
    }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        encode_png(&self.annotated)
    }
}

/// Shared, stateless detection pipeline
pub struct Detector {
    model: Arc<dyn Model>,
    annotator: Annotator,
}

impl Detector {
    pub fn new(model: Arc<dyn Model>) -> Self {
        Self::with_annotator(model, Annotator::new())
    }

    pub fn with_annotator(model: Arc<dyn Model>, annotator: Annotator) -> Self {
        Self { model, annotator }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Run the model over `frame` and render its detections.
    ///
    /// Filtering by `confidence` is left to the model. Thresholds outside
    /// (0, 1] are a configuration error; malformed frames and model failures
    /// are inference errors.
    pub fn infer(&self, frame: &Frame, confidence: f32) -> Result<Inference> {
        let confidence = validate_confidence(confidence).map_err(Error::Configuration)?;

        let image = frame.to_rgb_image().ok_or_else(|| {
            Error::Inference(format!(
                "Malformed frame {}: {}x{} with {} channels and {} bytes",
                frame.index(),
                frame.width(),
                frame.height(),
                frame.channels(),
                frame.data().len()
            ))
        })?;

        let detections = self.model.predict(&image, confidence).map_err(|e| {
            warn!("Model {} failed on frame {}: {}", self.model.name(), frame.index(), e);
            Error::Inference(e.to_string())
        })?;

        debug!(
            "Frame {}: {} detections at confidence {:.2}",
            frame.index(),
            detections.len(),
            confidence
        );

        Ok(Inference {
            annotated: self.annotator.annotate(&image, &detections),
            detections,
            frame_index: frame.index(),
        })
    }
}
