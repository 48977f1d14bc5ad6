//! Persisted detection history records

use crate::types::{RecordId, SourceType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A detection committed to history. Write-once; only whole-record deletion is allowed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub id: RecordId,
    pub source_type: SourceType,
    /// Original filename or URL. Empty for webcam captures.
    pub source_path: String,
    /// Encoded annotated frame (PNG)
    pub detected_image: Vec<u8>,
}

impl fmt::Debug for DetectionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectionRecord")
            .field("id", &self.id)
            .field("source_type", &self.source_type)
            .field("source_path", &self.source_path)
            .field("detected_image", &format_args!("<{} bytes>", self.detected_image.len()))
            .finish()
    }
}

/// Record payload before the store assigns an id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub source_type: SourceType,
    pub source_path: String,
    pub detected_image: Vec<u8>,
}

impl NewRecord {
    pub fn new(source_type: SourceType, source_path: impl Into<String>, detected_image: Vec<u8>) -> Self {
        Self {
            source_type,
            source_path: source_path.into(),
            detected_image,
        }
    }

    pub fn with_id(self, id: RecordId) -> DetectionRecord {
        DetectionRecord {
            id,
            source_type: self.source_type,
            source_path: self.source_path,
            detected_image: self.detected_image,
        }
    }
}
