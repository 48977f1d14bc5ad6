//! Video file, camera and remote stream capture

use super::device::DeviceLease;
use super::resolver::ResolvedStream;
use super::FrameSource;
use crate::error::VisionError;
use crate::frame::Frame;
use solanum_core::SourceType;
use std::path::Path;
use tracing::{debug, info, warn};

/// Open native capture handle
pub trait CaptureDevice: Send {
    /// Read the next frame. `Ok(None)` signals the end of the stream.
    fn read(&mut self) -> Result<Option<Frame>, VisionError>;

    /// Release the native handle. Must be safe to call more than once.
    fn release(&mut self);
}

/// Camera open parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraRequest {
    pub device: u32,
    pub resolution: (u32, u32),
    pub frame_rate: u32,
}

/// Native video backend
pub trait CaptureBackend: Send + Sync {
    fn open_file(&self, path: &Path) -> Result<Box<dyn CaptureDevice>, VisionError>;

    fn open_camera(&self, request: &CameraRequest) -> Result<Box<dyn CaptureDevice>, VisionError>;

    fn open_stream(&self, stream: &ResolvedStream) -> Result<Box<dyn CaptureDevice>, VisionError>;

    fn name(&self) -> &'static str;
}

/// Backend used when no video library is compiled in
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVideoBackend;

impl NoVideoBackend {
    fn unsupported(what: &str) -> VisionError {
        VisionError::Unsupported(format!(
            "{} capture requires building with the `opencv` feature",
            what
        ))
    }
}

impl CaptureBackend for NoVideoBackend {
    fn open_file(&self, _path: &Path) -> Result<Box<dyn CaptureDevice>, VisionError> {
        Err(Self::unsupported("Video file"))
    }

    fn open_camera(&self, _request: &CameraRequest) -> Result<Box<dyn CaptureDevice>, VisionError> {
        Err(Self::unsupported("Camera"))
    }

    fn open_stream(&self, _stream: &ResolvedStream) -> Result<Box<dyn CaptureDevice>, VisionError> {
        Err(Self::unsupported("Stream"))
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Frame source over a capture device.
///
/// Frames are numbered from 0 and optionally scaled to a fixed size. A read
/// error ends the source; the device is released on End, on `close` and on drop.
pub struct CaptureSource {
    source_type: SourceType,
    label: String,
    device: Option<Box<dyn CaptureDevice>>,
    lease: Option<DeviceLease>,
    frame_size: Option<(u32, u32)>,
    next_index: u64,
}

impl CaptureSource {
    pub fn new(source_type: SourceType, label: String, device: Box<dyn CaptureDevice>) -> Self {
        Self {
            source_type,
            label,
            device: Some(device),
            lease: None,
            frame_size: None,
            next_index: 0,
        }
    }

    /// Hold a camera lease for as long as the device is open
    pub fn with_lease(mut self, lease: DeviceLease) -> Self {
        self.lease = Some(lease);
        self
    }

    pub fn with_frame_size(mut self, frame_size: Option<(u32, u32)>) -> Self {
        self.frame_size = frame_size;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl FrameSource for CaptureSource {
    fn source_type(&self) -> SourceType {
        self.source_type
    }

    fn next_frame(&mut self) -> Option<Frame> {
        let device = self.device.as_mut()?;
        match device.read() {
            Ok(Some(frame)) => {
                let frame = frame.with_index(self.next_index);
                self.next_index += 1;
                Some(match self.frame_size {
                    Some((width, height)) => frame.resized(width, height),
                    None => frame,
                })
            }
            Ok(None) => {
                debug!("{} source '{}' reached end after {} frames", self.source_type, self.label, self.next_index);
                self.close();
                None
            }
            Err(e) => {
                warn!("{} source '{}' read failed, ending: {}", self.source_type, self.label, e);
                self.close();
                None
            }
        }
    }

    fn close(&mut self) {
        if let Some(mut device) = self.device.take() {
            device.release();
            info!("Released {} source '{}'", self.source_type, self.label);
        }
        self.lease = None;
    }

    fn is_closed(&self) -> bool {
        self.device.is_none()
    }
}

impl Drop for CaptureSource {
    fn drop(&mut self) {
        self.close();
    }
}
