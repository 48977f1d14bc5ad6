//! Detection history store

use crate::backend::HistoryBackend;
use crate::config::HistoryConfig;
use crate::memory::MemoryBackend;
use crate::sled_backend::SledBackend;
use solanum_core::{DetectionRecord, Error, NewRecord, RecordId, Result, SourceType};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Sole owner of all detection records.
///
/// A store that could not be opened stays usable as a value: every history
/// operation then fails with `Error::StoreUnavailable`, while the rest of the
/// application keeps working.
#[derive(Clone)]
pub struct HistoryStore {
    backend: Option<Arc<dyn HistoryBackend>>,
    unavailable_reason: String,
}

impl HistoryStore {
    pub fn with_backend(backend: Arc<dyn HistoryBackend>) -> Self {
        Self {
            backend: Some(backend),
            unavailable_reason: String::new(),
        }
    }

    /// Open the configured store, degrading to a disabled store on failure
    pub fn open(config: &HistoryConfig) -> Self {
        match Self::open_strict(config) {
            Ok(store) => store,
            Err(e) => {
                warn!("History disabled: {}", e);
                Self::disabled(e.to_string())
            }
        }
    }

    /// Open the configured store, returning the failure instead of degrading
    pub fn open_strict(config: &HistoryConfig) -> Result<Self> {
        if !config.enabled {
            return Err(Error::StoreUnavailable("history is disabled in configuration".to_string()));
        }
        config.validate().map_err(Error::StoreUnavailable)?;
        let backend = SledBackend::open(&config.path)?;
        Ok(Self::with_backend(Arc::new(backend)))
    }

    pub fn in_memory() -> Self {
        Self::with_backend(Arc::new(MemoryBackend::new()))
    }

    pub fn disabled(reason: impl Into<String>) -> Self {
        Self {
            backend: None,
            unavailable_reason: reason.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match self.backend {
            Some(_) => None,
            None => Some(self.unavailable_reason.as_str()),
        }
    }

    fn backend(&self) -> Result<&Arc<dyn HistoryBackend>> {
        self.backend
            .as_ref()
            .ok_or_else(|| Error::StoreUnavailable(self.unavailable_reason.clone()))
    }

    /// Persist a detection and return its id
    pub fn append(
        &self,
        source_type: SourceType,
        source_path: impl Into<String>,
        detected_image: Vec<u8>,
    ) -> Result<RecordId> {
        let backend = self.backend()?;
        let source_path = source_path.into();
        let id = backend
            .append(NewRecord::new(source_type, source_path.clone(), detected_image))
            .map_err(into_persistence)?;
        info!("Saved {} detection '{}' as record {}", source_type, source_path, id);
        Ok(id)
    }

    /// Records in insertion order, oldest first
    pub fn list(&self) -> Result<Vec<DetectionRecord>> {
        let records = self.backend()?.list().map_err(into_persistence)?;
        debug!("Listed {} history records", records.len());
        Ok(records)
    }

    pub fn get(&self, id: RecordId) -> Result<Option<DetectionRecord>> {
        self.backend()?.get(id).map_err(into_persistence)
    }

    /// Delete one record. Deleting an unknown id is not an error and returns false.
    pub fn delete_by_id(&self, id: RecordId) -> Result<bool> {
        let deleted = self.backend()?.delete(id).map_err(into_persistence)?;
        if deleted {
            info!("Deleted history record {}", id);
        } else {
            debug!("History record {} not found for deletion", id);
        }
        Ok(deleted)
    }

    pub fn len(&self) -> Result<usize> {
        self.backend()?.len().map_err(into_persistence)
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|n| n == 0)
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.as_ref().map(|b| b.name()).unwrap_or("disabled")
    }
}

/// Backends report failures as persistence errors; keep other kinds as they are
fn into_persistence(err: Error) -> Error {
    match err {
        Error::Io(e) => Error::Persistence(e.to_string()),
        other => other,
    }
}
