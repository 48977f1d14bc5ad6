//! Raw frames as produced by frame sources

use image::{imageops::FilterType, DynamicImage, ImageFormat, RgbImage};
use solanum_core::{Error, Result};
use std::fmt;
use std::io::Cursor;

/// One still image sampled from a source.
///
/// Pixels are interleaved 8-bit samples. Only 3-channel RGB frames whose
/// buffer matches their dimensions are accepted by the detector; anything
/// else is treated as malformed.
#[derive(Clone, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
    index: u64,
}

impl Frame {
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>, index: u64) -> Self {
        Self {
            width,
            height,
            channels,
            data,
            index,
        }
    }

    pub fn from_rgb(image: RgbImage, index: u64) -> Self {
        let (width, height) = image.dimensions();
        Self::new(width, height, 3, image.into_raw(), index)
    }

    pub fn from_dynamic(image: DynamicImage, index: u64) -> Self {
        Self::from_rgb(image.to_rgb8(), index)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Position of the frame within its source, starting at 0
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn with_index(mut self, index: u64) -> Self {
        self.index = index;
        self
    }

    pub fn is_well_formed(&self) -> bool {
        let expected = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|p| p.checked_mul(3));
        self.channels == 3 && !self.data.is_empty() && expected == Some(self.data.len())
    }

    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        if !self.is_well_formed() {
            return None;
        }
        RgbImage::from_raw(self.width, self.height, self.data.clone())
    }

    /// Scale to `width` x `height`. Malformed frames are returned unchanged.
    pub fn resized(self, width: u32, height: u32) -> Frame {
        if (self.width, self.height) == (width, height) {
            return self;
        }
        match self.to_rgb_image() {
            Some(image) => {
                let scaled = image::imageops::resize(&image, width, height, FilterType::Triangle);
                Frame::from_rgb(scaled, self.index)
            }
            None => self,
        }
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("index", &self.index)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Encode an annotated frame as PNG for the history store
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| Error::Persistence(format!("PNG encoding failed: {}", e)))?;
    Ok(buffer.into_inner())
}
