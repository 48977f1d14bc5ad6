//! OpenCV videoio capture backend

use super::capture::{CameraRequest, CaptureBackend, CaptureDevice};
use super::resolver::ResolvedStream;
use crate::error::VisionError;
use crate::frame::Frame;
use opencv::{
    core::Mat,
    imgproc::{cvt_color, COLOR_BGR2RGB},
    prelude::*,
    videoio::{VideoCapture, CAP_ANY, CAP_PROP_FPS, CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH},
};
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct OpenCvBackend;

impl OpenCvBackend {
    pub fn new() -> Self {
        Self
    }

    fn checked(capture: VideoCapture, what: &str) -> Result<Box<dyn CaptureDevice>, VisionError> {
        if !capture.is_opened()? {
            return Err(VisionError::Camera(format!("{} failed to open", what)));
        }
        Ok(Box::new(OpenCvDevice {
            capture: Some(capture),
        }))
    }
}

impl CaptureBackend for OpenCvBackend {
    fn open_file(&self, path: &Path) -> Result<Box<dyn CaptureDevice>, VisionError> {
        let name = path.to_string_lossy();
        let capture = VideoCapture::from_file(&name, CAP_ANY)
            .map_err(|e| VisionError::Decode(format!("Failed to open video {}: {}", name, e)))?;
        Self::checked(capture, &format!("Video {}", name))
    }

    fn open_camera(&self, request: &CameraRequest) -> Result<Box<dyn CaptureDevice>, VisionError> {
        let mut capture = VideoCapture::new(request.device as i32, CAP_ANY)
            .map_err(|e| VisionError::Camera(format!("Failed to open camera {}: {}", request.device, e)))?;
        if !capture.is_opened()? {
            return Err(VisionError::Camera(format!("Camera {} failed to open", request.device)));
        }

        let (width, height) = request.resolution;
        capture
            .set(CAP_PROP_FRAME_WIDTH, width as f64)
            .map_err(|e| VisionError::Camera(format!("Failed to set width: {}", e)))?;
        capture
            .set(CAP_PROP_FRAME_HEIGHT, height as f64)
            .map_err(|e| VisionError::Camera(format!("Failed to set height: {}", e)))?;
        if request.frame_rate > 0 {
            capture
                .set(CAP_PROP_FPS, request.frame_rate as f64)
                .map_err(|e| VisionError::Camera(format!("Failed to set FPS: {}", e)))?;
        }

        info!(
            "Camera {} initialized at {}x{} @ {}fps",
            request.device, width, height, request.frame_rate
        );
        Ok(Box::new(OpenCvDevice {
            capture: Some(capture),
        }))
    }

    fn open_stream(&self, stream: &ResolvedStream) -> Result<Box<dyn CaptureDevice>, VisionError> {
        let capture = VideoCapture::from_file(&stream.stream_url, CAP_ANY)
            .map_err(|e| VisionError::Decode(format!("Failed to open stream for {}: {}", stream.source_url, e)))?;
        Self::checked(capture, &format!("Stream for {}", stream.source_url))
    }

    fn name(&self) -> &'static str {
        "opencv"
    }
}

struct OpenCvDevice {
    capture: Option<VideoCapture>,
}

impl CaptureDevice for OpenCvDevice {
    fn read(&mut self) -> Result<Option<Frame>, VisionError> {
        let Some(capture) = self.capture.as_mut() else {
            return Ok(None);
        };

        let mut bgr = Mat::default();
        if !capture.read(&mut bgr)? || bgr.empty() {
            return Ok(None);
        }

        let mut rgb = Mat::default();
        cvt_color(&bgr, &mut rgb, COLOR_BGR2RGB, 0)?;

        let width = rgb.cols() as u32;
        let height = rgb.rows() as u32;
        let data = rgb.data_bytes()?.to_vec();
        Ok(Some(Frame::new(width, height, 3, data, 0)))
    }

    fn release(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            if let Err(e) = capture.release() {
                warn!("Failed to release capture: {}", e);
            }
        }
    }
}

impl Drop for OpenCvDevice {
    fn drop(&mut self) {
        self.release();
    }
}
