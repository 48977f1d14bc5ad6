use solanum_core::{DetectionRecord, NewRecord, RecordId, Result};

/// Storage backend for detection history.
///
/// Every operation is atomic for a single record. Implementations return
/// `Error::Persistence` on storage-layer failures.
pub trait HistoryBackend: Send + Sync {
    /// Persist a new record and return its id. Ids grow strictly and are never reused.
    fn append(&self, record: NewRecord) -> Result<RecordId>;

    /// All records, oldest first.
    fn list(&self) -> Result<Vec<DetectionRecord>>;

    fn get(&self, id: RecordId) -> Result<Option<DetectionRecord>>;

    /// Remove a record. Returns whether one existed.
    fn delete(&self, id: RecordId) -> Result<bool>;

    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        self.len().map(|n| n == 0)
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str;
}
