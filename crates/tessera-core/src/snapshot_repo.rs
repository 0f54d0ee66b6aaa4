use dashmap::DashMap;
use std::collections::BTreeMap;

use crate::content::Content;
use crate::item::{RepIdentity, SnapshotName};

/// Named snapshots of one representation, ordered by name
pub type Snapshots = BTreeMap<SnapshotName, Content>;

/// Per-run store of named content snapshots
///
/// Not persisted. Access is synchronized per representation, so independent
/// representations can be compiled concurrently; within one representation
/// the last write wins.
#[derive(Debug, Default)]
pub struct SnapshotRepo {
    snapshots: DashMap<RepIdentity, Snapshots>,
}

impl SnapshotRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, rep: &RepIdentity, name: &SnapshotName) -> Option<Content> {
        self.snapshots
            .get(rep)
            .and_then(|snapshots| snapshots.get(name).cloned())
    }

    pub fn set(&self, rep: &RepIdentity, name: SnapshotName, content: Content) {
        self.snapshots
            .entry(rep.clone())
            .or_default()
            .insert(name, content);
    }

    /// All snapshots currently recorded for `rep`
    pub fn get_all(&self, rep: &RepIdentity) -> Snapshots {
        self.snapshots
            .get(rep)
            .map(|snapshots| snapshots.clone())
            .unwrap_or_default()
    }

    /// Copy every snapshot in `snapshots` into the entry for `rep`
    pub fn set_all(&self, rep: &RepIdentity, snapshots: Snapshots) {
        self.snapshots
            .entry(rep.clone())
            .or_default()
            .extend(snapshots);
    }

    /// Whether the final (`last`) content of `rep` exists for this run
    pub fn has_final_content(&self, rep: &RepIdentity) -> bool {
        self.snapshots
            .get(rep)
            .is_some_and(|snapshots| snapshots.contains_key(&SnapshotName::last()))
    }
}
