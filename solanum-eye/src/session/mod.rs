//! Detection sessions

mod pacer;
mod single_shot;
mod streaming;

pub use pacer::FramePacer;
pub use single_shot::SingleShotDetection;
pub use streaming::StreamingSession;

use crate::detector::Inference;
use solanum_core::Error;
use std::fmt;
use std::sync::Arc;

/// Lifecycle of a streaming session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    Running,
    /// Stopped on request
    Stopped,
    /// Source ran out of frames
    Exhausted,
    /// Source could not be opened
    Failed,
}

impl SessionState {
    /// Terminal states guarantee the frame source has been released
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Stopped | SessionState::Exhausted | SessionState::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Running => "running",
            SessionState::Stopped => "stopped",
            SessionState::Exhausted => "exhausted",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of one streaming iteration
#[derive(Debug)]
pub enum Step {
    Frame(Arc<Inference>),
    /// Inference failed for this frame; the session keeps running
    Skipped { frame_index: u64, error: Error },
    Finished(SessionState),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames_processed: u64,
    pub frames_skipped: u64,
    pub captures: u64,
}
