use std::time::{Duration, Instant};

/// Spaces frame reads to a target frame rate. A rate of 0 disables pacing.
#[derive(Debug)]
pub struct FramePacer {
    interval: Option<Duration>,
    last: Option<Instant>,
}

impl FramePacer {
    pub fn new(frame_rate: u32) -> Self {
        Self {
            interval: (frame_rate > 0).then(|| Duration::from_nanos(1_000_000_000 / frame_rate as u64)),
            last: None,
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Sleep until one interval has passed since the previous call
    pub fn wait(&mut self) {
        if let (Some(interval), Some(last)) = (self.interval, self.last) {
            let elapsed = last.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }
}
