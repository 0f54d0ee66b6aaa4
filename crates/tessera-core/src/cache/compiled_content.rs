use dashmap::DashMap;
use tracing::debug;

use crate::item::{RepIdentity, Site};
use crate::snapshot_repo::Snapshots;

use super::{CacheError, Result};

/// Final snapshots of each representation, kept across runs
///
/// Entries are replaced wholesale and never merged. Reads and writes of the
/// same entry are serialized by the underlying concurrent map.
#[derive(Debug, Default)]
pub struct CompiledContentCache {
    entries: DashMap<RepIdentity, Snapshots>,
}

impl CompiledContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, rep: &RepIdentity) -> Option<Snapshots> {
        self.entries.get(rep).map(|entry| entry.clone())
    }

    /// Replace the entry for `rep` with `snapshots`
    pub fn set(&self, rep: RepIdentity, snapshots: Snapshots) {
        self.entries.insert(rep, snapshots);
    }

    pub fn contains(&self, rep: &RepIdentity) -> bool {
        self.entries.contains_key(rep)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove entries of items that are no longer part of `site`
    ///
    /// Extension point for maintenance passes; compilation itself never
    /// prunes. Returns the number of removed entries.
    pub fn prune(&self, site: &Site) -> usize {
        let before = self.entries.len();
        self.entries.retain(|rep, _| site.contains_item(&rep.item));
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!("Pruned {} compiled content cache entries", removed);
        }
        removed
    }

    /// Snapshot of all entries, sorted by rep identity
    pub fn entries(&self) -> Vec<(RepIdentity, Snapshots)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

/// Serialize one entry for the durable store
pub(crate) fn encode_entry(snapshots: &Snapshots) -> Result<Vec<u8>> {
    bincode::serialize(snapshots).map_err(CacheError::from)
}

pub(crate) fn decode_entry(bytes: &[u8]) -> Result<Snapshots> {
    bincode::deserialize(bytes).map_err(CacheError::from)
}
