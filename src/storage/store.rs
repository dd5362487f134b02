// SuretyStore - Persistent key-value storage using sled
//
// Provides typed access for storing:
// - Ledger snapshots (with checksum)
// - The append-only ledger event log

use crate::app::FlightSurety;
use crate::ledger::LedgerEvent;
use sha2::{Digest, Sha256};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Key prefixes for organizing data
mod keys {
    pub const LEDGER_SNAPSHOT: &[u8] = b"ledger:snapshot";
    pub const LEDGER_CHECKSUM: &[u8] = b"ledger:checksum";
    pub const EVENT_PREFIX: &[u8] = b"events:";
}

/// Errors from storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    OpenFailed(String),

    #[error("Database operation failed: {0}")]
    DatabaseError(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Snapshot checksum mismatch")]
    ChecksumMismatch,

    #[error("Flush failed: {0}")]
    FlushFailed(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::DatabaseError(err.to_string())
    }
}

/// Statistics about the storage
#[derive(Clone, Debug)]
pub struct StorageStats {
    /// Number of keys in the database
    pub key_count: usize,
    /// Approximate disk size in bytes
    pub disk_size_bytes: u64,
}

/// Persistent store for ledger data
///
/// Uses sled for crash-safe, embedded storage.
/// All writes are atomic and durable after flush.
pub struct SuretyStore {
    db: sled::Db,
}

impl SuretyStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        Ok(Self { db })
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.db.is_empty())
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::FlushFailed(e.to_string()))?;
        Ok(())
    }

    /// Get storage statistics
    pub fn stats(&self) -> Result<StorageStats, StoreError> {
        Ok(StorageStats {
            key_count: self.db.len(),
            disk_size_bytes: self.db.size_on_disk().unwrap_or(0),
        })
    }

    // ========================================================================
    // RAW KEY-VALUE OPERATIONS
    // ========================================================================

    /// Put raw bytes
    pub fn put_raw(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.db.insert(key, value)?;
        Ok(())
    }

    /// Get raw bytes
    pub fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get(key)?.map(|v| v.to_vec()))
    }

    /// Delete a key
    pub fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.db.remove(key)?;
        Ok(())
    }

    /// List all keys with a given prefix
    pub fn list_keys_with_prefix(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, StoreError> {
        let mut keys = Vec::new();
        for result in self.db.scan_prefix(prefix) {
            let (key, _) = result?;
            keys.push(key.to_vec());
        }
        Ok(keys)
    }

    // ========================================================================
    // LEDGER SNAPSHOTS
    // ========================================================================

    /// Save the ledger snapshot and its checksum in one batch
    pub fn save_ledger(&self, ledger: &FlightSurety) -> Result<(), StoreError> {
        let bytes = ledger
            .to_bytes()
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;
        let checksum = Sha256::digest(&bytes);

        let mut batch = sled::Batch::default();
        batch.insert(keys::LEDGER_SNAPSHOT, bytes);
        batch.insert(keys::LEDGER_CHECKSUM, checksum.as_slice());
        self.db.apply_batch(batch)?;

        debug!(version = ledger.version(), "ledger snapshot saved");
        Ok(())
    }

    /// Load the ledger snapshot, verifying its checksum
    pub fn load_ledger(&self) -> Result<Option<FlightSurety>, StoreError> {
        let bytes = match self.get_raw(keys::LEDGER_SNAPSHOT)? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        let expected = self.get_raw(keys::LEDGER_CHECKSUM)?;
        let actual = Sha256::digest(&bytes);
        if expected.as_deref() != Some(actual.as_slice()) {
            return Err(StoreError::ChecksumMismatch);
        }

        let ledger = FlightSurety::from_bytes(&bytes)
            .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
        Ok(Some(ledger))
    }

    // ========================================================================
    // EVENT LOG
    // ========================================================================

    /// Append events to the log. Returns the sequence number of the last one.
    pub fn append_events(&self, events: &[LedgerEvent]) -> Result<u64, StoreError> {
        let mut seq = self.event_count()? as u64;
        for event in events {
            let bytes = postcard::to_allocvec(event)
                .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;
            self.put_raw(&event_key(seq), &bytes)?;
            seq += 1;
        }
        Ok(seq)
    }

    /// Load the whole event log in order
    pub fn load_events(&self) -> Result<Vec<LedgerEvent>, StoreError> {
        let mut events = Vec::new();
        for result in self.db.scan_prefix(keys::EVENT_PREFIX) {
            let (_, value) = result?;
            let event = postcard::from_bytes(&value)
                .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
            events.push(event);
        }
        Ok(events)
    }

    pub fn event_count(&self) -> Result<usize, StoreError> {
        Ok(self.list_keys_with_prefix(keys::EVENT_PREFIX)?.len())
    }
}

/// Big-endian sequence keeps scan order equal to append order
fn event_key(seq: u64) -> Vec<u8> {
    [keys::EVENT_PREFIX, &seq.to_be_bytes()].concat()
}
