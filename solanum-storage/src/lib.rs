//! solanum-storage: detection history persistence
//!
//! An append-only log of committed detections with delete-by-id. Records are
//! ordered by insertion (oldest first) and ids are never reused.

pub mod backend;
pub mod config;
pub mod memory;
pub mod sled_backend;
pub mod store;

pub use backend::HistoryBackend;
pub use config::HistoryConfig;
pub use memory::MemoryBackend;
pub use sled_backend::SledBackend;
pub use store::HistoryStore;
