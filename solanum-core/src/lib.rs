pub mod types;
pub mod error;
pub mod record;

pub use error::{Error, Result};
pub use types::{BoundingBox, Detection, RecordId, SourceType};
pub use record::{DetectionRecord, NewRecord};
