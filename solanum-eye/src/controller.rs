//! Facade used by interactive front ends

use crate::config::{confidence_from_percent, validate_confidence, EyeConfig};
use crate::detector::{Detector, Inference};
use crate::session::{SessionState, SingleShotDetection, Step, StreamingSession};
use crate::source::{SourceDescriptor, SourceOpener};
use solanum_core::{DetectionRecord, Error, RecordId, Result, SourceType};
use solanum_storage::HistoryStore;
use std::sync::Arc;
use tracing::{debug, info};

/// Holds the selected source, the confidence threshold and the last single-shot
/// result, and routes each user action to the right component.
pub struct DetectionController {
    single_shot: SingleShotDetection,
    session: StreamingSession,
    history: Arc<HistoryStore>,
    source: Option<SourceDescriptor>,
    confidence: f32,
    last_detection: Option<(SourceDescriptor, Inference)>,
}

impl DetectionController {
    pub fn new(
        opener: Arc<SourceOpener>,
        detector: Arc<Detector>,
        history: Arc<HistoryStore>,
        config: &EyeConfig,
    ) -> Self {
        Self {
            single_shot: SingleShotDetection::new(opener.clone(), detector.clone(), history.clone()),
            session: StreamingSession::new(opener, detector, history.clone(), config.frame_rate),
            history,
            source: None,
            confidence: config.confidence,
            last_detection: None,
        }
    }

    /// Select the source for the next detection. Stops a running stream.
    pub fn select_source(&mut self, descriptor: SourceDescriptor) {
        if self.session.is_running() {
            self.session.stop();
        }
        info!("Selected source {:?}", descriptor);
        self.last_detection = None;
        self.source = Some(descriptor);
    }

    pub fn selected_source(&self) -> Option<&SourceDescriptor> {
        self.source.as_ref()
    }

    pub fn set_confidence(&mut self, confidence: f32) -> Result<()> {
        self.confidence = validate_confidence(confidence).map_err(Error::Configuration)?;
        debug!("Confidence set to {:.2}", self.confidence);
        Ok(())
    }

    /// Set the threshold from a 25-100 percentage
    pub fn set_confidence_percent(&mut self, percent: u32) -> Result<()> {
        let confidence = confidence_from_percent(percent).map_err(Error::Configuration)?;
        self.set_confidence(confidence)
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    fn require_source(&self) -> Result<&SourceDescriptor> {
        self.source
            .as_ref()
            .ok_or_else(|| Error::InvalidState("no source selected".to_string()))
    }

    /// Detect on the selected image. The result is kept until saved or replaced.
    pub fn detect_once(&mut self) -> Result<&Inference> {
        let descriptor = self.require_source()?.clone();
        let inference = self.single_shot.run(&descriptor, self.confidence)?;
        let (_, inference) = self.last_detection.insert((descriptor, inference));
        Ok(inference)
    }

    pub fn last_detection(&self) -> Option<&Inference> {
        self.last_detection.as_ref().map(|(_, inference)| inference)
    }

    /// Persist the last single-shot result
    pub fn save_last_detection(&self) -> Result<RecordId> {
        let (descriptor, inference) = self
            .last_detection
            .as_ref()
            .ok_or_else(|| Error::InvalidState("no detection to save".to_string()))?;
        self.single_shot
            .commit(descriptor.source_type(), &descriptor.label(), &inference.annotated)
    }

    pub fn start_stream(&self) -> Result<()> {
        let descriptor = self.require_source()?;
        self.session.start(descriptor, self.confidence)
    }

    pub fn next_frame(&self) -> Step {
        self.session.next()
    }

    pub fn stop_stream(&self) -> SessionState {
        self.session.stop()
    }

    pub fn capture_current(&self) -> Result<RecordId> {
        self.session.capture_current()
    }

    pub fn session(&self) -> &StreamingSession {
        &self.session
    }

    pub fn list_history(&self) -> Result<Vec<DetectionRecord>> {
        self.history.list()
    }

    pub fn delete_history(&self, id: RecordId) -> Result<bool> {
        self.history.delete_by_id(id)
    }

    pub fn history_available(&self) -> bool {
        self.history.is_available()
    }

    /// Whether the selected source is streamed rather than detected once
    pub fn is_streaming_source(&self) -> bool {
        self.source
            .as_ref()
            .map(|d| d.source_type() != SourceType::Image)
            .unwrap_or(false)
    }
}
