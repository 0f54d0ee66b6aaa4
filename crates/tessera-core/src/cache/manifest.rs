use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::{CacheError, Result, CACHE_VERSION};
use crate::item::RepIdentity;

/// Manifest of the durable compiled content cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheManifest {
    /// Schema version for cache format
    pub version: u32,

    /// Build fingerprint of the writer (invalidate on mismatch)
    pub fingerprint: String,

    /// Stored entries: rep identity -> entry record
    pub entries: FxHashMap<RepIdentity, EntryRecord>,
}

/// Location and integrity data for one stored entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    /// Blake3 hash of the serialized entry; also its file name
    pub checksum: String,

    /// Timestamp when cached (for diagnostics)
    pub cached_at: u64,
}

impl CacheManifest {
    /// Create a new empty manifest with the given build fingerprint
    pub fn new(fingerprint: String) -> Self {
        Self {
            version: CACHE_VERSION,
            fingerprint,
            entries: FxHashMap::default(),
        }
    }

    /// Check if manifest version matches current cache version
    pub fn is_version_compatible(&self) -> bool {
        self.version == CACHE_VERSION
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(CacheError::from)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(CacheError::from)
    }

    pub fn insert_entry(&mut self, rep: RepIdentity, record: EntryRecord) {
        self.entries.insert(rep, record);
    }

    pub fn get_entry(&self, rep: &RepIdentity) -> Option<&EntryRecord> {
        self.entries.get(rep)
    }
}

impl EntryRecord {
    pub fn new(checksum: String) -> Self {
        Self {
            checksum,
            cached_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs())
                .unwrap_or_default(),
        }
    }
}
