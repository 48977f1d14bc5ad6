//! Exclusive camera device ownership

use parking_lot::Mutex;
use solanum_core::{Error, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Tracks which camera devices currently have a live handle
#[derive(Clone, Default)]
pub struct DeviceRegistry {
    held: Arc<Mutex<HashSet<u32>>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a device. Fails while another lease on the same device is alive.
    pub fn acquire(&self, device: u32) -> Result<DeviceLease> {
        let mut held = self.held.lock();
        if !held.insert(device) {
            return Err(Error::SourceUnavailable(format!("Camera {} is already in use", device)));
        }
        debug!("Camera {} acquired", device);
        Ok(DeviceLease {
            device,
            held: self.held.clone(),
        })
    }

    pub fn is_held(&self, device: u32) -> bool {
        self.held.lock().contains(&device)
    }
}

/// Claim on a camera device, released on drop
pub struct DeviceLease {
    device: u32,
    held: Arc<Mutex<HashSet<u32>>>,
}

impl DeviceLease {
    pub fn device(&self) -> u32 {
        self.device
    }
}

impl Drop for DeviceLease {
    fn drop(&mut self) {
        self.held.lock().remove(&self.device);
        debug!("Camera {} released", self.device);
    }
}
