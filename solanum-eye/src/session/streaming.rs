//! Continuous detection over video, camera and remote sources

use super::pacer::FramePacer;
use super::{SessionState, SessionStats, Step};
use crate::config::validate_confidence;
use crate::detector::{Detector, Inference};
use crate::source::{FrameSource, SourceDescriptor, SourceOpener};
use parking_lot::Mutex;
use solanum_core::{Error, RecordId, Result, SourceType};
use solanum_storage::HistoryStore;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Streaming detection session.
///
/// `Idle -> Running -> {Stopped, Exhausted, Failed}`. All methods take `&self`;
/// per-frame work holds the session lock, so `stop` from another thread
/// waits for at most the frame in flight and then releases the source.
pub struct StreamingSession {
    opener: Arc<SourceOpener>,
    detector: Arc<Detector>,
    history: Arc<HistoryStore>,
    frame_rate: u32,
    stop_requested: AtomicBool,
    inner: Mutex<SessionInner>,
}

struct SessionInner {
    state: SessionState,
    source: Option<Box<dyn FrameSource>>,
    source_type: Option<SourceType>,
    source_label: String,
    confidence: f32,
    last: Option<Arc<Inference>>,
    stats: SessionStats,
}

impl SessionInner {
    fn release(&mut self, state: SessionState) {
        if let Some(mut source) = self.source.take() {
            source.close();
        }
        self.state = state;
    }
}

impl StreamingSession {
    pub fn new(
        opener: Arc<SourceOpener>,
        detector: Arc<Detector>,
        history: Arc<HistoryStore>,
        frame_rate: u32,
    ) -> Self {
        Self {
            opener,
            detector,
            history,
            frame_rate,
            stop_requested: AtomicBool::new(false),
            inner: Mutex::new(SessionInner {
                state: SessionState::Idle,
                source: None,
                source_type: None,
                source_label: String::new(),
                confidence: crate::config::DEFAULT_CONFIDENCE,
                last: None,
                stats: SessionStats::default(),
            }),
        }
    }

    /// Open the source and enter Running.
    ///
    /// Fails with `InvalidState` while already running or for still images.
    /// A source that cannot be opened moves the session to Failed and the
    /// error is returned as is.
    pub fn start(&self, descriptor: &SourceDescriptor, confidence: f32) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.state == SessionState::Running {
            return Err(Error::InvalidState("a stream is already running".to_string()));
        }
        if !descriptor.source_type().is_continuous() {
            return Err(Error::InvalidState(format!(
                "{} sources are detected once, not streamed",
                descriptor.source_type()
            )));
        }
        let confidence = validate_confidence(confidence).map_err(Error::Configuration)?;

        self.stop_requested.store(false, Ordering::SeqCst);
        inner.last = None;
        inner.stats = SessionStats::default();
        inner.source_type = Some(descriptor.source_type());
        inner.source_label = descriptor.label();
        inner.confidence = confidence;

        match self.opener.open(descriptor) {
            Ok(source) => {
                inner.source = Some(source);
                inner.state = SessionState::Running;
                info!("Streaming {:?} at confidence {:.2}", descriptor, confidence);
                Ok(())
            }
            Err(e) => {
                inner.release(SessionState::Failed);
                Err(e)
            }
        }
    }

    /// Pull and process one frame
    pub fn next(&self) -> Step {
        let mut inner = self.inner.lock();
        if inner.state != SessionState::Running {
            return Step::Finished(inner.state);
        }
        if self.stop_requested.load(Ordering::SeqCst) {
            inner.release(SessionState::Stopped);
            info!("Stream stopped after {} frames", inner.stats.frames_processed);
            return Step::Finished(SessionState::Stopped);
        }

        let frame = inner.source.as_mut().and_then(|source| source.next_frame());
        let Some(frame) = frame else {
            inner.release(SessionState::Exhausted);
            info!(
                "Stream exhausted: {} frames processed, {} skipped",
                inner.stats.frames_processed, inner.stats.frames_skipped
            );
            return Step::Finished(SessionState::Exhausted);
        };

        match self.detector.infer(&frame, inner.confidence) {
            Ok(inference) => {
                let inference = Arc::new(inference);
                inner.last = Some(inference.clone());
                inner.stats.frames_processed += 1;
                Step::Frame(inference)
            }
            Err(error) => {
                warn!("Skipping frame {}: {}", frame.index(), error);
                inner.stats.frames_skipped += 1;
                Step::Skipped {
                    frame_index: frame.index(),
                    error,
                }
            }
        }
    }

    /// Drive the session until it finishes or `on_step` breaks.
    ///
    /// Frames are paced to the configured frame rate. Breaking stops the
    /// session. The final `Finished` step is also passed to `on_step`.
    pub fn run<F>(&self, mut on_step: F) -> SessionState
    where
        F: FnMut(&Step) -> ControlFlow<()>,
    {
        let mut pacer = FramePacer::new(self.frame_rate);
        loop {
            pacer.wait();
            let step = self.next();
            if let Step::Finished(state) = step {
                let _ = on_step(&step);
                return state;
            }
            if on_step(&step).is_break() {
                return self.stop();
            }
        }
    }

    /// Stop a running session and release its source before returning.
    /// Idempotent; returns the resulting state.
    ///
    /// Blocks while another thread is inside `next`, so a read stalled on a
    /// camera or network stream delays the return until that read completes.
    /// The loop does not pull another frame once the stop is requested.
    pub fn stop(&self) -> SessionState {
        self.stop_requested.store(true, Ordering::SeqCst);
        let mut inner = self.inner.lock();
        if inner.state == SessionState::Running {
            inner.release(SessionState::Stopped);
            info!("Stream stopped after {} frames", inner.stats.frames_processed);
        }
        inner.state
    }

    /// Persist the most recent annotated frame
    pub fn capture_current(&self) -> Result<RecordId> {
        let (inference, source_type, label) = {
            let inner = self.inner.lock();
            if inner.state != SessionState::Running {
                return Err(Error::InvalidState(format!("cannot capture while {}", inner.state)));
            }
            let inference = inner
                .last
                .clone()
                .ok_or_else(|| Error::InvalidState("no frame has been processed yet".to_string()))?;
            let source_type = inner
                .source_type
                .ok_or_else(|| Error::InvalidState("no source selected".to_string()))?;
            (inference, source_type, inner.source_label.clone())
        };

        let png = inference.to_png()?;
        let id = self.history.append(source_type, label, png)?;
        self.inner.lock().stats.captures += 1;
        debug!("Captured frame {} as record {}", inference.frame_index, id);
        Ok(id)
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == SessionState::Running
    }

    pub fn stats(&self) -> SessionStats {
        self.inner.lock().stats
    }

    pub fn last_inference(&self) -> Option<Arc<Inference>> {
        self.inner.lock().last.clone()
    }

    pub fn source_type(&self) -> Option<SourceType> {
        self.inner.lock().source_type
    }
}

impl Drop for StreamingSession {
    fn drop(&mut self) {
        self.stop();
    }
}
