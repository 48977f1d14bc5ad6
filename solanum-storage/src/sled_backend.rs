//! Sled-backed history log

use crate::backend::HistoryBackend;
use solanum_core::{DetectionRecord, Error, NewRecord, RecordId, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const DETECTIONS_TREE: &str = "detections";

/// On-disk backend. Keys are big-endian record ids, so iteration order is id order.
/// Values are bincode-encoded [`NewRecord`]s; the id lives only in the key.
pub struct SledBackend {
    db: sled::Db,
    tree: sled::Tree,
    path: Option<PathBuf>,
}

impl SledBackend {
    /// Open (or create) the database directory at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::StoreUnavailable(format!("Cannot create {}: {}", parent.display(), e))
                })?;
            }
        }

        let db = sled::open(path)
            .map_err(|e| Error::StoreUnavailable(format!("Sled error at {}: {}", path.display(), e)))?;
        let backend = Self::from_db(db, Some(path.to_path_buf()))?;
        info!("History store opened at {:?}", path);
        Ok(backend)
    }

    /// Database that is deleted when dropped
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| Error::StoreUnavailable(format!("Sled error: {}", e)))?;
        Self::from_db(db, None)
    }

    fn from_db(db: sled::Db, path: Option<PathBuf>) -> Result<Self> {
        let tree = db
            .open_tree(DETECTIONS_TREE)
            .map_err(|e| Error::StoreUnavailable(format!("Sled open_tree error: {}", e)))?;
        Ok(Self { db, tree, path })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn next_id(&self) -> Result<RecordId> {
        // generate_id is monotonic across restarts; shift so ids start at 1.
        let raw = self
            .db
            .generate_id()
            .map_err(|e| Error::Persistence(format!("Sled id generation error: {}", e)))?;
        Ok(RecordId(raw + 1))
    }

    fn decode(key: &[u8], value: &[u8]) -> Option<DetectionRecord> {
        let id = RecordId::from_key(key)?;
        match bincode::deserialize::<NewRecord>(value) {
            Ok(stored) => Some(stored.with_id(id)),
            Err(e) => {
                warn!("Skipping undecodable history record {}: {}", id, e);
                None
            }
        }
    }
}

impl HistoryBackend for SledBackend {
    fn append(&self, record: NewRecord) -> Result<RecordId> {
        let id = self.next_id()?;
        let value = bincode::serialize(&record)
            .map_err(|e| Error::Persistence(format!("Record encoding error: {}", e)))?;

        self.tree
            .insert(id.to_key(), value)
            .map_err(|e| Error::Persistence(format!("Sled insert error: {}", e)))?;
        self.flush()?;

        debug!("Appended history record {}", id);
        Ok(id)
    }

    fn list(&self) -> Result<Vec<DetectionRecord>> {
        let mut records = Vec::new();
        for entry in self.tree.iter() {
            let (key, value) = entry.map_err(|e| Error::Persistence(format!("Sled scan error: {}", e)))?;
            if let Some(record) = Self::decode(&key, &value) {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn get(&self, id: RecordId) -> Result<Option<DetectionRecord>> {
        match self.tree.get(id.to_key()) {
            Ok(Some(value)) => Ok(Self::decode(&id.to_key(), &value)),
            Ok(None) => Ok(None),
            Err(e) => Err(Error::Persistence(format!("Sled get error: {}", e))),
        }
    }

    fn delete(&self, id: RecordId) -> Result<bool> {
        let removed = self
            .tree
            .remove(id.to_key())
            .map_err(|e| Error::Persistence(format!("Sled remove error: {}", e)))?;
        if removed.is_some() {
            self.flush()?;
            debug!("Deleted history record {}", id);
        }
        Ok(removed.is_some())
    }

    /// Counts decodable records only, agreeing with `list`
    fn len(&self) -> Result<usize> {
        let mut count = 0;
        for entry in self.tree.iter() {
            let (key, value) = entry.map_err(|e| Error::Persistence(format!("Sled scan error: {}", e)))?;
            if RecordId::from_key(&key).is_some() && bincode::deserialize::<NewRecord>(&value).is_ok() {
                count += 1;
            }
        }
        Ok(count)
    }

    fn flush(&self) -> Result<()> {
        self.tree
            .flush()
            .map(|_| ())
            .map_err(|e| Error::Persistence(format!("Sled flush error: {}", e)))
    }

    fn name(&self) -> &'static str {
        "sled"
    }
}
