//! Frame sources
//!
//! One implementation per source kind behind the [`FrameSource`] interface.
//! Sources are opened through a [`SourceOpener`], which owns the capture
//! backend, the stream resolver and the camera device registry.

pub mod capture;
pub mod device;
#[cfg(feature = "opencv")]
pub mod cv_backend;
pub mod resolver;
pub mod still;

pub use capture::{CameraRequest, CaptureBackend, CaptureDevice, CaptureSource, NoVideoBackend};
pub use device::{DeviceLease, DeviceRegistry};
pub use resolver::{ResolvedStream, StreamResolver, YtDlpResolver};
pub use still::ImageSource;

use crate::config::EyeConfig;
use crate::frame::Frame;
use solanum_core::{Error, Result, SourceType};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// What to read frames from
#[derive(Clone, PartialEq, Eq)]
pub enum SourceDescriptor {
    /// Still image on disk
    Image { path: PathBuf },
    /// Uploaded still image held in memory
    ImageBytes { name: String, bytes: Vec<u8> },
    /// Stored video file
    Video { path: PathBuf },
    /// Local camera device
    Webcam { device: u32 },
    /// Remote video page, resolved into a stream before capture
    YouTube { url: String },
}

impl SourceDescriptor {
    pub fn image(path: impl Into<PathBuf>) -> Self {
        SourceDescriptor::Image { path: path.into() }
    }

    pub fn video(path: impl Into<PathBuf>) -> Self {
        SourceDescriptor::Video { path: path.into() }
    }

    pub fn webcam(device: u32) -> Self {
        SourceDescriptor::Webcam { device }
    }

    pub fn youtube(url: impl Into<String>) -> Self {
        SourceDescriptor::YouTube { url: url.into() }
    }

    pub fn source_type(&self) -> SourceType {
        match self {
            SourceDescriptor::Image { .. } | SourceDescriptor::ImageBytes { .. } => SourceType::Image,
            SourceDescriptor::Video { .. } => SourceType::Video,
            SourceDescriptor::Webcam { .. } => SourceType::Webcam,
            SourceDescriptor::YouTube { .. } => SourceType::YouTube,
        }
    }

    /// Value recorded as the history `source_path`: file name or URL, empty for webcams
    pub fn label(&self) -> String {
        match self {
            SourceDescriptor::Image { path } | SourceDescriptor::Video { path } => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            SourceDescriptor::ImageBytes { name, .. } => name.clone(),
            SourceDescriptor::Webcam { .. } => String::new(),
            SourceDescriptor::YouTube { url } => url.clone(),
        }
    }
}

impl std::fmt::Debug for SourceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceDescriptor::Image { path } => write!(f, "Image({})", path.display()),
            SourceDescriptor::ImageBytes { name, bytes } => {
                write!(f, "ImageBytes({}, {} bytes)", name, bytes.len())
            }
            SourceDescriptor::Video { path } => write!(f, "Video({})", path.display()),
            SourceDescriptor::Webcam { device } => write!(f, "Webcam({})", device),
            SourceDescriptor::YouTube { url } => write!(f, "YouTube({})", url),
        }
    }
}

/// An open acquisition handle.
///
/// `next_frame` returning `None` means End. `close` releases the underlying
/// file, device or stream; it is idempotent and `next_frame` after `close`
/// returns `None`. Implementations also release on drop.
pub trait FrameSource: Send {
    fn source_type(&self) -> SourceType;

    fn next_frame(&mut self) -> Option<Frame>;

    fn close(&mut self);

    fn is_closed(&self) -> bool;
}

/// Opens frame sources for descriptors
pub struct SourceOpener {
    backend: Arc<dyn CaptureBackend>,
    resolver: Arc<dyn StreamResolver>,
    devices: DeviceRegistry,
    resolution: (u32, u32),
    frame_rate: u32,
    frame_size: Option<(u32, u32)>,
}

impl SourceOpener {
    pub fn new(
        config: &EyeConfig,
        backend: Arc<dyn CaptureBackend>,
        resolver: Arc<dyn StreamResolver>,
    ) -> Self {
        Self {
            backend,
            resolver,
            devices: DeviceRegistry::new(),
            resolution: config.resolution,
            frame_rate: config.frame_rate,
            frame_size: config.frame_size,
        }
    }

    /// Opener wired with the compiled-in capture backend and the yt-dlp resolver
    pub fn with_defaults(config: &EyeConfig) -> Self {
        Self::new(
            config,
            default_backend(),
            Arc::new(YtDlpResolver::new(config.resolver_program.clone())),
        )
    }

    pub fn devices(&self) -> &DeviceRegistry {
        &self.devices
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn open(&self, descriptor: &SourceDescriptor) -> Result<Box<dyn FrameSource>> {
        let source = self.open_inner(descriptor);
        match &source {
            Ok(_) => info!("Opened {:?}", descriptor),
            Err(e) => warn!("Failed to open {:?}: {}", descriptor, e),
        }
        source
    }

    fn open_inner(&self, descriptor: &SourceDescriptor) -> Result<Box<dyn FrameSource>> {
        let label = descriptor.label();
        match descriptor {
            SourceDescriptor::Image { path } => Ok(Box::new(ImageSource::open(path)?)),
            SourceDescriptor::ImageBytes { name, bytes } => {
                Ok(Box::new(ImageSource::from_bytes(name, bytes)?))
            }
            SourceDescriptor::Video { path } => {
                if !path.is_file() {
                    return Err(Error::SourceUnavailable(format!(
                        "Video file {} does not exist",
                        path.display()
                    )));
                }
                let device = self.backend.open_file(path).map_err(Error::from)?;
                Ok(Box::new(
                    CaptureSource::new(SourceType::Video, label, device).with_frame_size(self.frame_size),
                ))
            }
            SourceDescriptor::Webcam { device } => {
                // The lease is dropped, releasing the device, if the backend fails to open it.
                let lease = self.devices.acquire(*device)?;
                let request = CameraRequest {
                    device: *device,
                    resolution: self.resolution,
                    frame_rate: self.frame_rate,
                };
                let capture = self.backend.open_camera(&request).map_err(Error::from)?;
                Ok(Box::new(
                    CaptureSource::new(SourceType::Webcam, label, capture)
                        .with_lease(lease)
                        .with_frame_size(self.frame_size),
                ))
            }
            SourceDescriptor::YouTube { url } => {
                let stream = self.resolver.resolve(url).map_err(Error::from)?;
                let capture = self.backend.open_stream(&stream).map_err(Error::from)?;
                Ok(Box::new(
                    CaptureSource::new(SourceType::YouTube, label, capture).with_frame_size(self.frame_size),
                ))
            }
        }
    }
}

/// Capture backend selected by cargo features
pub fn default_backend() -> Arc<dyn CaptureBackend> {
    #[cfg(feature = "opencv")]
    {
        Arc::new(cv_backend::OpenCvBackend::new())
    }
    #[cfg(not(feature = "opencv"))]
    {
        Arc::new(NoVideoBackend)
    }
}
