//! Still image source: one frame, then End

use super::FrameSource;
use crate::frame::Frame;
use image::RgbImage;
use solanum_core::{Error, Result, SourceType};
use std::path::Path;
use tracing::debug;

pub struct ImageSource {
    label: String,
    image: Option<RgbImage>,
    closed: bool,
}

impl ImageSource {
    /// Decode an image file. Format is detected from content, not the extension.
    pub fn open(path: &Path) -> Result<Self> {
        let image = image::ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|e| Error::SourceUnavailable(format!("Cannot open image {}: {}", path.display(), e)))?
            .decode()
            .map_err(|e| Error::SourceUnavailable(format!("Cannot decode image {}: {}", path.display(), e)))?;
        Ok(Self::from_image(path.display().to_string(), image.to_rgb8()))
    }

    /// Decode an uploaded image held in memory
    pub fn from_bytes(name: &str, bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| Error::SourceUnavailable(format!("Cannot decode uploaded image {}: {}", name, e)))?;
        Ok(Self::from_image(name.to_string(), image.to_rgb8()))
    }

    pub fn from_image(label: String, image: RgbImage) -> Self {
        Self {
            label,
            image: Some(image),
            closed: false,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl FrameSource for ImageSource {
    fn source_type(&self) -> SourceType {
        SourceType::Image
    }

    fn next_frame(&mut self) -> Option<Frame> {
        if self.closed {
            return None;
        }
        self.image.take().map(|image| Frame::from_rgb(image, 0))
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.image = None;
            debug!("Closed image source {}", self.label);
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
