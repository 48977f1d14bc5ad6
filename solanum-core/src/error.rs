use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("History store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable label for the error kind, used by UI drivers to pick a message style.
    pub fn category(&self) -> &'static str {
        match self {
            Error::SourceUnavailable(_) => "source_unavailable",
            Error::Inference(_) => "inference",
            Error::Persistence(_) => "persistence",
            Error::StoreUnavailable(_) => "store_unavailable",
            Error::InvalidState(_) => "invalid_state",
            Error::Configuration(_) => "configuration",
            Error::Io(_) => "io",
        }
    }

    /// Errors a streaming loop absorbs by skipping the current frame.
    pub fn is_frame_local(&self) -> bool {
        matches!(self, Error::Inference(_))
    }

    /// Errors that only affect the history feature.
    pub fn is_history_error(&self) -> bool {
        matches!(self, Error::Persistence(_) | Error::StoreUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
