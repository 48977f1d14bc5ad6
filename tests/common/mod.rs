#![allow(dead_code)]

use image::{Rgb, RgbImage};
use solanum_core::{BoundingBox, Detection};
use solanum_eye::error::VisionError;
use solanum_eye::source::{CameraRequest, CaptureBackend, CaptureDevice, ResolvedStream, StreamResolver};
use solanum_eye::{Detector, EyeConfig, Frame, Model, SourceOpener};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Synthetic capture backend. Every device yields `frames` frames (forever when `None`).
pub struct SyntheticBackend {
    frames: Option<usize>,
    bad_frame: Option<usize>,
    read_delay: Duration,
    pub open_handles: Arc<AtomicUsize>,
}

impl SyntheticBackend {
    pub fn new(frames: Option<usize>) -> Self {
        Self {
            frames,
            bad_frame: None,
            read_delay: Duration::ZERO,
            open_handles: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Emit an empty frame at `index`, which the detector rejects
    pub fn with_bad_frame(mut self, index: usize) -> Self {
        self.bad_frame = Some(index);
        self
    }

    /// Block every read for `delay`, like a slow camera
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }

    fn device(&self) -> Result<Box<dyn CaptureDevice>, VisionError> {
        self.open_handles.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SyntheticDevice {
            remaining: self.frames,
            next: 0,
            bad_frame: self.bad_frame,
            read_delay: self.read_delay,
            open_handles: Some(self.open_handles.clone()),
        }))
    }
}

impl CaptureBackend for SyntheticBackend {
    fn open_file(&self, _path: &Path) -> Result<Box<dyn CaptureDevice>, VisionError> {
        self.device()
    }

    fn open_camera(&self, _request: &CameraRequest) -> Result<Box<dyn CaptureDevice>, VisionError> {
        self.device()
    }

    fn open_stream(&self, _stream: &ResolvedStream) -> Result<Box<dyn CaptureDevice>, VisionError> {
        self.device()
    }

    fn name(&self) -> &'static str {
        "synthetic"
    }
}

struct SyntheticDevice {
    remaining: Option<usize>,
    next: usize,
    bad_frame: Option<usize>,
    read_delay: Duration,
    open_handles: Option<Arc<AtomicUsize>>,
}

impl CaptureDevice for SyntheticDevice {
    fn read(&mut self) -> Result<Option<Frame>, VisionError> {
        if !self.read_delay.is_zero() {
            std::thread::sleep(self.read_delay);
        }
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return Ok(None);
            }
            *remaining -= 1;
        }
        let index = self.next;
        self.next += 1;
        if self.bad_frame == Some(index) {
            return Ok(Some(Frame::new(0, 0, 3, Vec::new(), 0)));
        }
        Ok(Some(Frame::from_rgb(RgbImage::from_pixel(48, 27, Rgb([60, 140, 50])), 0)))
    }

    fn release(&mut self) {
        if let Some(handles) = self.open_handles.take() {
            handles.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

pub struct StaticResolver;

impl StreamResolver for StaticResolver {
    fn resolve(&self, url: &str) -> Result<ResolvedStream, VisionError> {
        Ok(ResolvedStream {
            source_url: url.to_string(),
            stream_url: "https://media.example/stream.m3u8".to_string(),
        })
    }
}

/// Leaf model: fixed candidate scores, filtered by the threshold
pub struct LeafModel {
    scores: Vec<f32>,
}

impl LeafModel {
    pub fn new(scores: &[f32]) -> Self {
        Self { scores: scores.to_vec() }
    }
}

impl Model for LeafModel {
    fn name(&self) -> &str {
        "leaf"
    }

    fn predict(&self, image: &RgbImage, confidence: f32) -> Result<Vec<Detection>, VisionError> {
        let (width, height) = image.dimensions();
        let names = ["early_blight", "healthy", "late_blight"];
        Ok(self
            .scores
            .iter()
            .enumerate()
            .filter(|(_, s)| **s >= confidence)
            .map(|(i, s)| {
                let bbox = BoundingBox::new(2.0 * i as f32, 2.0, width as f32 / 3.0, height as f32 / 3.0);
                Detection::new(i % 3, names[i % 3], *s, bbox)
            })
            .collect())
    }
}

pub fn config() -> EyeConfig {
    EyeConfig {
        frame_rate: 0,
        frame_size: None,
        ..EyeConfig::default()
    }
}

pub fn opener(backend: SyntheticBackend) -> Arc<SourceOpener> {
    Arc::new(SourceOpener::new(&config(), Arc::new(backend), Arc::new(StaticResolver)))
}

pub fn detector(scores: &[f32]) -> Arc<Detector> {
    Arc::new(Detector::new(Arc::new(LeafModel::new(scores))))
}

/// Write a leaf-coloured JPEG into `dir`
pub fn leaf_image(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let image = RgbImage::from_fn(64, 64, |x, y| {
        if (x as i32 - 32).pow(2) + (y as i32 - 32).pow(2) < 400 {
            Rgb([40, 150, 40])
        } else {
            Rgb([230, 230, 220])
        }
    });
    image.save(&path).expect("write leaf image");
    path
}

pub fn video_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"").expect("write video placeholder");
    path
}
