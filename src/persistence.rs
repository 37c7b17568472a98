//! Key-value blob persistence for the record store.
//!
//! Persisted state is a sequence of independently serialized record blobs
//! under a single named key. The whole store is written back after every
//! mutation and loaded once per process entry; at ≤ 20 records there is
//! nothing to gain from incremental writes.
//!
//! Each record is its own JSON blob so that one corrupt entry never takes the
//! rest of the store down with it: decode failures are skipped with a
//! warning and the surviving records keep their relative order.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{FenceError, Result};
use crate::GeofenceRecord;

// ============================================================================
// Traits
// ============================================================================

/// A key-value store holding an ordered sequence of blobs per key.
///
/// This is the narrow surface the host's storage layer has to provide
/// (user defaults, shared preferences, a file, SQLite, ...).
pub trait BlobStore {
    /// Read the blob sequence under `key`. `None` when the key has never
    /// been written.
    fn read(&self, key: &str) -> Result<Option<Vec<String>>>;

    /// Replace the blob sequence under `key` wholesale.
    fn write(&mut self, key: &str, blobs: &[String]) -> Result<()>;
}

/// Loads and saves the full record set as one logical operation.
pub trait PersistenceBridge {
    /// Load all records. Empty on first run; corrupt individual entries are
    /// skipped, never fatal to the whole load.
    fn load_all(&self) -> Result<Vec<GeofenceRecord>>;

    /// Overwrite the durable store with exactly these records.
    fn save_all(&mut self, records: &[GeofenceRecord]) -> Result<()>;
}

// ============================================================================
// JSON Blob Bridge
// ============================================================================

/// [`PersistenceBridge`] over any [`BlobStore`], one JSON blob per record.
#[derive(Debug, Clone)]
pub struct BlobBridge<S: BlobStore> {
    store: S,
    key: String,
}

impl<S: BlobStore> BlobBridge<S> {
    /// Bridge records through `store` under `key`.
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    fn decode_blob<T: DeserializeOwned>(blob: &str) -> Result<T> {
        serde_json::from_str(blob).map_err(|e| FenceError::Deserialization {
            message: e.to_string(),
        })
    }

    fn encode_blob<T: Serialize>(value: &T) -> Result<String> {
        serde_json::to_string(value).map_err(FenceError::persistence)
    }
}

impl<S: BlobStore> PersistenceBridge for BlobBridge<S> {
    fn load_all(&self) -> Result<Vec<GeofenceRecord>> {
        let blobs = match self.store.read(&self.key)? {
            Some(blobs) => blobs,
            None => return Ok(Vec::new()),
        };

        let mut records = Vec::with_capacity(blobs.len());
        for blob in &blobs {
            match Self::decode_blob::<GeofenceRecord>(blob) {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("[Persistence] Skipping corrupt record blob: {}", e),
            }
        }
        log::info!(
            "[Persistence] Loaded {} of {} record blobs from '{}'",
            records.len(),
            blobs.len(),
            self.key
        );
        Ok(records)
    }

    fn save_all(&mut self, records: &[GeofenceRecord]) -> Result<()> {
        let blobs = records
            .iter()
            .map(Self::encode_blob)
            .collect::<Result<Vec<String>>>()?;
        self.store.write(&self.key, &blobs)
    }
}

// ============================================================================
// In-Memory Blob Store
// ============================================================================

/// Volatile [`BlobStore`] for tests and hosts without durable storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBlobStore {
    entries: std::collections::HashMap<String, Vec<String>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject raw blobs under a key (corruption scenarios in tests).
    pub fn seed(&mut self, key: &str, blobs: Vec<String>) {
        self.entries.insert(key.to_string(), blobs);
    }
}

impl BlobStore for InMemoryBlobStore {
    fn read(&self, key: &str) -> Result<Option<Vec<String>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, blobs: &[String]) -> Result<()> {
        self.entries.insert(key.to_string(), blobs.to_vec());
        Ok(())
    }
}

// ============================================================================
// SQLite Blob Store
// ============================================================================

/// Durable [`BlobStore`] backed by a single SQLite table.
///
/// Writes replace the whole key inside one transaction, so a crash mid-save
/// never leaves a half-written sequence behind.
#[cfg(feature = "persistence")]
pub struct SqliteBlobStore {
    db: rusqlite::Connection,
}

#[cfg(feature = "persistence")]
impl SqliteBlobStore {
    /// Open (or create) a blob store at `path`.
    pub fn open(path: &str) -> Result<Self> {
        let db = rusqlite::Connection::open(path).map_err(FenceError::persistence)?;
        Self::from_connection(db)
    }

    /// Open a private in-memory store (tests).
    pub fn open_in_memory() -> Result<Self> {
        let db = rusqlite::Connection::open_in_memory().map_err(FenceError::persistence)?;
        Self::from_connection(db)
    }

    fn from_connection(db: rusqlite::Connection) -> Result<Self> {
        db.execute(
            "CREATE TABLE IF NOT EXISTS blobs (
                store_key TEXT NOT NULL,
                seq INTEGER NOT NULL,
                blob TEXT NOT NULL,
                PRIMARY KEY (store_key, seq)
            )",
            [],
        )
        .map_err(FenceError::persistence)?;
        Ok(Self { db })
    }
}

#[cfg(feature = "persistence")]
impl BlobStore for SqliteBlobStore {
    fn read(&self, key: &str) -> Result<Option<Vec<String>>> {
        let mut stmt = self
            .db
            .prepare("SELECT blob FROM blobs WHERE store_key = ?1 ORDER BY seq")
            .map_err(FenceError::persistence)?;
        let rows = stmt
            .query_map(rusqlite::params![key], |row| row.get::<_, String>(0))
            .map_err(FenceError::persistence)?;

        let mut blobs = Vec::new();
        for row in rows {
            blobs.push(row.map_err(FenceError::persistence)?);
        }

        if blobs.is_empty() {
            // An empty sequence and a never-written key look the same here;
            // both mean "no records", which is all load_all needs.
            Ok(None)
        } else {
            Ok(Some(blobs))
        }
    }

    fn write(&mut self, key: &str, blobs: &[String]) -> Result<()> {
        let tx = self.db.transaction().map_err(FenceError::persistence)?;
        tx.execute("DELETE FROM blobs WHERE store_key = ?1", rusqlite::params![key])
            .map_err(FenceError::persistence)?;
        for (seq, blob) in blobs.iter().enumerate() {
            tx.execute(
                "INSERT INTO blobs (store_key, seq, blob) VALUES (?1, ?2, ?3)",
                rusqlite::params![key, seq as i64, blob],
            )
            .map_err(FenceError::persistence)?;
        }
        tx.commit().map_err(FenceError::persistence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GeoPoint, TriggerType};

    fn sample_records(count: usize) -> Vec<GeofenceRecord> {
        (0..count)
            .map(|i| {
                GeofenceRecord::new(
                    GeoPoint::new(51.5 + i as f64 * 0.01, -0.12),
                    100.0 + i as f64,
                    format!("fence {}", i),
                    if i % 2 == 0 { TriggerType::OnEntry } else { TriggerType::OnExit },
                )
            })
            .collect()
    }

    #[test]
    fn test_first_run_loads_empty() {
        let bridge = BlobBridge::new(InMemoryBlobStore::new(), "saved_items");
        assert!(bridge.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load_round_trips_in_order() {
        let records = sample_records(3);
        let mut bridge = BlobBridge::new(InMemoryBlobStore::new(), "saved_items");
        bridge.save_all(&records).unwrap();

        assert_eq!(bridge.load_all().unwrap(), records);
    }

    #[test]
    fn test_corrupt_blob_is_skipped_not_fatal() {
        let records = sample_records(3);
        let mut blobs: Vec<String> = records
            .iter()
            .map(|r| serde_json::to_string(r).unwrap())
            .collect();
        blobs[1] = "{not valid json".to_string();

        let mut store = InMemoryBlobStore::new();
        store.seed("saved_items", blobs);
        let bridge = BlobBridge::new(store, "saved_items");

        let loaded = bridge.load_all().unwrap();
        // Exactly the two valid records, in their original relative order
        assert_eq!(loaded, vec![records[0].clone(), records[2].clone()]);
    }

    #[test]
    fn test_save_is_whole_store_overwrite() {
        let records = sample_records(3);
        let mut bridge = BlobBridge::new(InMemoryBlobStore::new(), "saved_items");
        bridge.save_all(&records).unwrap();
        bridge.save_all(&records[..1]).unwrap();

        assert_eq!(bridge.load_all().unwrap(), records[..1].to_vec());
    }

    #[cfg(feature = "persistence")]
    #[test]
    fn test_sqlite_round_trip() {
        let records = sample_records(4);
        let mut bridge = BlobBridge::new(SqliteBlobStore::open_in_memory().unwrap(), "saved_items");
        bridge.save_all(&records).unwrap();

        assert_eq!(bridge.load_all().unwrap(), records);
    }

    #[cfg(feature = "persistence")]
    #[test]
    fn test_sqlite_overwrite_replaces_previous_sequence() {
        let records = sample_records(4);
        let mut bridge = BlobBridge::new(SqliteBlobStore::open_in_memory().unwrap(), "saved_items");
        bridge.save_all(&records).unwrap();
        bridge.save_all(&records[2..]).unwrap();

        assert_eq!(bridge.load_all().unwrap(), records[2..].to_vec());
    }

    #[cfg(feature = "persistence")]
    #[test]
    fn test_sqlite_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fences.db");
        let path = path.to_str().unwrap();
        let records = sample_records(2);

        {
            let mut bridge = BlobBridge::new(SqliteBlobStore::open(path).unwrap(), "saved_items");
            bridge.save_all(&records).unwrap();
        }

        let bridge = BlobBridge::new(SqliteBlobStore::open(path).unwrap(), "saved_items");
        assert_eq!(bridge.load_all().unwrap(), records);
    }
}
