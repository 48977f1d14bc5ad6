//! Fakes shared by the integration tests

#![allow(dead_code)]

use image::{Rgb, RgbImage};
use solanum_core::{BoundingBox, Detection};
use solanum_eye::error::VisionError;
use solanum_eye::source::{CameraRequest, CaptureBackend, CaptureDevice, ResolvedStream, StreamResolver};
use solanum_eye::{Detector, EyeConfig, Frame, Model, SourceOpener};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counters observed by tests after the devices are gone
#[derive(Default)]
pub struct Probe {
    pub opened: AtomicUsize,
    pub released: AtomicUsize,
    pub reads: AtomicUsize,
}

impl Probe {
    pub fn live(&self) -> usize {
        self.opened.load(Ordering::SeqCst) - self.released.load(Ordering::SeqCst)
    }
}

/// Backend producing synthetic frames
pub struct FakeBackend {
    /// Frames per device; `None` never ends
    pub frames: Option<usize>,
    /// Frame index replaced by a single-channel frame
    pub malformed_at: Option<usize>,
    pub probe: Arc<Probe>,
}

impl FakeBackend {
    pub fn new(frames: Option<usize>) -> Self {
        Self {
            frames,
            malformed_at: None,
            probe: Arc::new(Probe::default()),
        }
    }

    pub fn malformed_at(mut self, index: usize) -> Self {
        self.malformed_at = Some(index);
        self
    }

    fn device(&self) -> Box<dyn CaptureDevice> {
        self.probe.opened.fetch_add(1, Ordering::SeqCst);
        Box::new(FakeDevice {
            remaining: self.frames,
            produced: 0,
            malformed_at: self.malformed_at,
            probe: self.probe.clone(),
            released: false,
        })
    }
}

impl CaptureBackend for FakeBackend {
    fn open_file(&self, _path: &Path) -> Result<Box<dyn CaptureDevice>, VisionError> {
        Ok(self.device())
    }

    fn open_camera(&self, _request: &CameraRequest) -> Result<Box<dyn CaptureDevice>, VisionError> {
        Ok(self.device())
    }

    fn open_stream(&self, _stream: &ResolvedStream) -> Result<Box<dyn CaptureDevice>, VisionError> {
        Ok(self.device())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

struct FakeDevice {
    remaining: Option<usize>,
    produced: usize,
    malformed_at: Option<usize>,
    probe: Arc<Probe>,
    released: bool,
}

impl CaptureDevice for FakeDevice {
    fn read(&mut self) -> Result<Option<Frame>, VisionError> {
        if self.released {
            return Err(VisionError::Camera("read after release".to_string()));
        }
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return Ok(None);
            }
            *remaining -= 1;
        }
        self.probe.reads.fetch_add(1, Ordering::SeqCst);
        let index = self.produced;
        self.produced += 1;
        if self.malformed_at == Some(index) {
            return Ok(Some(Frame::new(32, 18, 1, vec![0; 32 * 18], 0)));
        }
        let shade = (index % 256) as u8;
        Ok(Some(Frame::from_rgb(RgbImage::from_pixel(32, 18, Rgb([shade, 128, 64])), 0)))
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.probe.released.fetch_add(1, Ordering::SeqCst);
        }
    }
}

pub struct FakeResolver;

impl StreamResolver for FakeResolver {
    fn resolve(&self, url: &str) -> Result<ResolvedStream, VisionError> {
        if !url.contains("youtu") {
            return Err(VisionError::Resolver(format!("Not a YouTube host: {}", url)));
        }
        Ok(ResolvedStream {
            source_url: url.to_string(),
            stream_url: format!("https://media.example/{}", url.len()),
        })
    }
}

/// Model returning fixed candidates filtered by the threshold
pub struct ThresholdModel {
    pub scores: Vec<f32>,
}

impl ThresholdModel {
    pub fn new(scores: &[f32]) -> Self {
        Self { scores: scores.to_vec() }
    }
}

impl Model for ThresholdModel {
    fn name(&self) -> &str {
        "threshold"
    }

    fn predict(&self, image: &RgbImage, confidence: f32) -> Result<Vec<Detection>, VisionError> {
        let (width, height) = image.dimensions();
        Ok(self
            .scores
            .iter()
            .enumerate()
            .filter(|(_, score)| **score >= confidence)
            .map(|(i, score)| {
                let bbox = BoundingBox::new(i as f32, i as f32, (width / 2) as f32, (height / 2) as f32);
                Detection::new(i % 3, format!("class_{}", i % 3), *score, bbox)
            })
            .collect())
    }
}

/// Model that raises on selected predict calls, counted from 0. `None` fails every call.
pub struct FailingModel {
    pub fail_on: Option<usize>,
    calls: AtomicUsize,
}

impl FailingModel {
    pub fn always() -> Self {
        Self {
            fail_on: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn on_call(call: usize) -> Self {
        Self {
            fail_on: Some(call),
            calls: AtomicUsize::new(0),
        }
    }
}

impl Model for FailingModel {
    fn name(&self) -> &str {
        "failing"
    }

    fn predict(&self, image: &RgbImage, confidence: f32) -> Result<Vec<Detection>, VisionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.map_or(true, |n| n == call) {
            return Err(VisionError::Model(format!("output tensor missing on call {}", call)));
        }
        ThresholdModel::new(&[0.9]).predict(image, confidence)
    }
}

pub fn test_config() -> EyeConfig {
    EyeConfig {
        frame_rate: 0,
        frame_size: None,
        ..EyeConfig::default()
    }
}

pub fn opener(backend: FakeBackend) -> (Arc<SourceOpener>, Arc<Probe>) {
    let probe = backend.probe.clone();
    let opener = SourceOpener::new(&test_config(), Arc::new(backend), Arc::new(FakeResolver));
    (Arc::new(opener), probe)
}

pub fn detector() -> Arc<Detector> {
    Arc::new(Detector::new(Arc::new(ThresholdModel::new(&[0.3, 0.55, 0.8]))))
}

/// An empty file standing in for a video on disk
pub fn video_file(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"").expect("write video placeholder");
    path
}
