//! In-memory history backend

use crate::backend::HistoryBackend;
use parking_lot::RwLock;
use solanum_core::{DetectionRecord, NewRecord, RecordId, Result};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Volatile backend. Ids come from a sequence that only moves forward.
pub struct MemoryBackend {
    records: RwLock<BTreeMap<RecordId, NewRecord>>,
    next_id: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryBackend for MemoryBackend {
    fn append(&self, record: NewRecord) -> Result<RecordId> {
        let mut records = self.records.write();
        // Allocate under the write lock so key order matches insertion order.
        let id = RecordId(self.next_id.fetch_add(1, Ordering::SeqCst));
        records.insert(id, record);
        Ok(id)
    }

    fn list(&self) -> Result<Vec<DetectionRecord>> {
        let records = self.records.read();
        Ok(records
            .iter()
            .map(|(id, stored)| stored.clone().with_id(*id))
            .collect())
    }

    fn get(&self, id: RecordId) -> Result<Option<DetectionRecord>> {
        Ok(self.records.read().get(&id).cloned().map(|s| s.with_id(id)))
    }

    fn delete(&self, id: RecordId) -> Result<bool> {
        Ok(self.records.write().remove(&id).is_some())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.records.read().len())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
