//! Error types for solanum-eye

use solanum_core::Error as CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Camera error: {0}")]
    Camera(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Stream resolution error: {0}")]
    Resolver(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Backend unavailable: {0}")]
    Unsupported(String),

    #[cfg(feature = "opencv")]
    #[error("OpenCV error: {0}")]
    OpenCv(String),
}

impl From<VisionError> for CoreError {
    fn from(err: VisionError) -> Self {
        match err {
            VisionError::Model(msg) => CoreError::Inference(msg),
            VisionError::Config(msg) => CoreError::Configuration(msg),
            other => CoreError::SourceUnavailable(other.to_string()),
        }
    }
}

#[cfg(feature = "opencv")]
impl From<opencv::Error> for VisionError {
    fn from(err: opencv::Error) -> Self {
        VisionError::OpenCv(err.message)
    }
}
