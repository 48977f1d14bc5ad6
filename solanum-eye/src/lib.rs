//! solanum-eye: frame acquisition and detection pipeline
//!
//! Pulls frames from still images, video files, cameras and remote streams,
//! runs an object-detection model over each frame, renders the results, and
//! hands confirmed detections to the history store.

pub mod annotate;
pub mod config;
pub mod controller;
pub mod detector;
pub mod error;
pub mod frame;
pub mod models;
pub mod session;
pub mod source;

pub use config::EyeConfig;
pub use controller::DetectionController;
pub use detector::{Detector, Inference};
pub use error::VisionError;
pub use frame::Frame;
pub use models::Model;
pub use session::{SessionState, SessionStats, SingleShotDetection, Step, StreamingSession};
pub use source::{FrameSource, SourceDescriptor, SourceOpener};
