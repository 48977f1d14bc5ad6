use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of input a detection came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    Image,
    Video,
    Webcam,
    YouTube,
}

impl SourceType {
    pub const ALL: [SourceType; 4] = [
        SourceType::Image,
        SourceType::Video,
        SourceType::Webcam,
        SourceType::YouTube,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SourceType::Image => "Image",
            SourceType::Video => "Video",
            SourceType::Webcam => "Webcam",
            SourceType::YouTube => "YouTube",
        }
    }

    /// Continuous sources are driven by a streaming session rather than a single shot.
    pub fn is_continuous(&self) -> bool {
        !matches!(self, SourceType::Image)
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(SourceType::Image),
            "video" => Ok(SourceType::Video),
            "webcam" => Ok(SourceType::Webcam),
            "youtube" => Ok(SourceType::YouTube),
            other => Err(format!("unknown source type '{}'", other)),
        }
    }
}

/// Store-assigned identifier of a history record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl RecordId {
    pub fn to_key(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    pub fn from_key(key: &[u8]) -> Option<Self> {
        let bytes: [u8; 8] = key.try_into().ok()?;
        Some(RecordId(u64::from_be_bytes(bytes)))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Axis-aligned box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1.min(x2),
            y: y1.min(y2),
            width: (x2 - x1).abs(),
            height: (y2 - y1).abs(),
        }
    }

    pub fn xmax(&self) -> f32 {
        self.x + self.width
    }

    pub fn ymax(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    pub fn intersection_area(&self, other: &BoundingBox) -> f32 {
        let l = self.x.max(other.x);
        let r = self.xmax().min(other.xmax());
        let t = self.y.max(other.y);
        let b = self.ymax().min(other.ymax());
        (r - l).max(0.0) * (b - t).max(0.0)
    }

    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let inter = self.intersection_area(other);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 || !union.is_finite() {
            return 0.0;
        }
        (inter / union).clamp(0.0, 1.0)
    }

    /// Clip the box to a `width` x `height` canvas. Returns `None` when nothing is left.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<BoundingBox> {
        if !self.is_finite() {
            return None;
        }
        let x1 = self.x.clamp(0.0, width as f32);
        let y1 = self.y.clamp(0.0, height as f32);
        let x2 = self.xmax().clamp(0.0, width as f32);
        let y2 = self.ymax().clamp(0.0, height as f32);
        if x2 - x1 < 1.0 || y2 - y1 < 1.0 {
            return None;
        }
        Some(BoundingBox::from_corners(x1, y1, x2, y2))
    }
}

/// One predicted object within a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class_id: usize,
    pub class_name: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(class_id: usize, class_name: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            class_id,
            class_name: class_name.into(),
            confidence,
            bbox,
        }
    }
}
