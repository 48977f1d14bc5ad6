//! One-off detection on a still image

use crate::detector::{Detector, Inference};
use crate::frame::encode_png;
use crate::source::{SourceDescriptor, SourceOpener};
use image::RgbImage;
use solanum_core::{Error, RecordId, Result, SourceType};
use solanum_storage::HistoryStore;
use std::sync::Arc;
use tracing::{info, warn};

pub struct SingleShotDetection {
    opener: Arc<SourceOpener>,
    detector: Arc<Detector>,
    history: Arc<HistoryStore>,
}

impl SingleShotDetection {
    pub fn new(opener: Arc<SourceOpener>, detector: Arc<Detector>, history: Arc<HistoryStore>) -> Self {
        Self {
            opener,
            detector,
            history,
        }
    }

    /// Detect objects in a still image. Nothing is persisted.
    pub fn run(&self, descriptor: &SourceDescriptor, confidence: f32) -> Result<Inference> {
        if descriptor.source_type() != SourceType::Image {
            return Err(Error::InvalidState(format!(
                "single-shot detection needs an image, got {}",
                descriptor.source_type()
            )));
        }

        let mut source = self.opener.open(descriptor)?;
        let frame = source.next_frame();
        source.close();
        let frame = frame.ok_or_else(|| Error::SourceUnavailable(format!("{:?} produced no frame", descriptor)))?;

        let inference = self.detector.infer(&frame, confidence)?;
        info!(
            "Detected {} objects in {}",
            inference.detections.len(),
            descriptor.label()
        );
        Ok(inference)
    }

    /// Persist an annotated image as a new history record
    pub fn commit(&self, source_type: SourceType, source_path: &str, annotated: &RgbImage) -> Result<RecordId> {
        let png = encode_png(annotated)?;
        self.history.append(source_type, source_path, png)
    }

    /// Run and persist in one step. A persistence failure does not discard the inference.
    pub fn run_and_commit(
        &self,
        descriptor: &SourceDescriptor,
        confidence: f32,
    ) -> Result<(Inference, Result<RecordId>)> {
        let inference = self.run(descriptor, confidence)?;
        let saved = self.commit(descriptor.source_type(), &descriptor.label(), &inference.annotated);
        if let Err(e) = &saved {
            warn!("Detection shown but not recorded: {}", e);
        }
        Ok((inference, saved))
    }
}
