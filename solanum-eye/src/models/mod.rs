//! Detection model capability

#[cfg(feature = "onnx")]
pub mod yolo;

#[cfg(feature = "onnx")]
pub use yolo::YoloModel;

use crate::error::VisionError;
use image::RgbImage;
use solanum_core::Detection;

/// Object-detection model.
///
/// `predict` returns only detections whose confidence is at least
/// `confidence`, with boxes in the pixel space of `image`.
pub trait Model: Send + Sync {
    fn name(&self) -> &str;

    fn predict(&self, image: &RgbImage, confidence: f32) -> Result<Vec<Detection>, VisionError>;
}

/// Greedy per-class non-maximum suppression. Input order does not matter.
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.retain(|d| d.confidence.is_finite() && d.bbox.is_finite());
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<Detection> = Vec::with_capacity(detections.len());
    for candidate in detections {
        let overlaps = keep
            .iter()
            .any(|k| k.class_id == candidate.class_id && k.bbox.iou(&candidate.bbox) > iou_threshold);
        if !overlaps {
            keep.push(candidate);
        }
    }
    keep
}
