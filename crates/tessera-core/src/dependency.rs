//! Dependency recording for incremental compilation
//!
//! While a representation compiles, every read of another item's content or
//! attributes is recorded as an edge from the item being compiled to the item
//! that was read. The graph is only recorded here; deciding outdatedness from
//! it is the job of the caller.

use indexmap::IndexMap;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::{CacheError, Result as CacheResult};
use crate::errors::CompileError;
use crate::item::Identifier;

/// What a dependency edge points at
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DependencyTarget {
    Item(Identifier),
    Layout(Identifier),
}

/// Which aspects of the target were read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyProps {
    pub raw_content: bool,
    pub attributes: bool,
    pub compiled_content: bool,
    pub path: bool,
}

impl DependencyProps {
    pub fn all() -> Self {
        Self {
            raw_content: true,
            attributes: true,
            compiled_content: true,
            path: true,
        }
    }

    pub fn raw_content() -> Self {
        Self {
            raw_content: true,
            ..Self::default()
        }
    }

    pub fn attributes() -> Self {
        Self {
            attributes: true,
            ..Self::default()
        }
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            raw_content: self.raw_content || other.raw_content,
            attributes: self.attributes || other.attributes,
            compiled_content: self.compiled_content || other.compiled_content,
            path: self.path || other.path,
        }
    }
}

type Graph = FxHashMap<Identifier, IndexMap<DependencyTarget, DependencyProps>>;

/// Accumulated dependency graph, shared by all compilations of a run
#[derive(Debug, Default)]
pub struct DependencyStore {
    graph: Mutex<Graph>,
}

impl DependencyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that compiling `from` read `to`; repeated edges merge their props
    pub fn record(&self, from: &Identifier, to: DependencyTarget, props: DependencyProps) {
        let mut graph = self.graph.lock();
        let edges = graph.entry(from.clone()).or_default();
        let merged = edges
            .get(&to)
            .map(|existing| existing.merge(props))
            .unwrap_or(props);
        edges.insert(to, merged);
    }

    /// Direct dependencies of `from`, in the order they were first recorded
    pub fn dependencies_of(&self, from: &Identifier) -> Vec<(DependencyTarget, DependencyProps)> {
        self.graph
            .lock()
            .get(from)
            .map(|edges| edges.iter().map(|(to, props)| (to.clone(), *props)).collect())
            .unwrap_or_default()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.lock().values().map(|edges| edges.len()).sum()
    }

    pub fn to_bytes(&self) -> CacheResult<Vec<u8>> {
        let graph = self.graph.lock();
        bincode::serialize(&*graph).map_err(CacheError::from)
    }

    pub fn from_bytes(bytes: &[u8]) -> CacheResult<Self> {
        let graph: Graph = bincode::deserialize(bytes)?;
        Ok(Self {
            graph: Mutex::new(graph),
        })
    }
}

/// Records read-dependencies of the item currently compiling
///
/// Holds a stack of frames; the top frame is the item that new edges are
/// recorded from. One tracker belongs to one compiling thread, so frames of
/// concurrently compiling representations never interleave.
#[derive(Debug)]
pub struct DependencyTracker {
    store: Arc<DependencyStore>,
    stack: Vec<Identifier>,
}

impl DependencyTracker {
    pub fn new(store: Arc<DependencyStore>) -> Self {
        Self {
            store,
            stack: Vec::new(),
        }
    }

    pub fn enter(&mut self, item: Identifier) {
        debug!("Entering dependency frame for {}", item);
        self.stack.push(item);
    }

    pub fn exit(&mut self) -> Result<Identifier, CompileError> {
        self.stack.pop().ok_or(CompileError::DependencyStackUnderflow)
    }

    /// Push a frame that is popped exactly once when the returned guard drops
    pub fn scope(&mut self, item: Identifier) -> DependencyScope<'_> {
        self.enter(item);
        DependencyScope { tracker: self }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn current(&self) -> Option<&Identifier> {
        self.stack.last()
    }

    /// Register an edge from the current frame to `target`
    ///
    /// Without an active frame nothing is compiling, so nothing is recorded.
    /// Items reading themselves are ignored.
    pub fn record_dependency(&self, target: DependencyTarget, props: DependencyProps) {
        let Some(current) = self.stack.last() else {
            return;
        };
        if let DependencyTarget::Item(identifier) = &target {
            if identifier == current {
                return;
            }
        }
        self.store.record(current, target, props);
    }
}

/// Guard for one dependency frame; see [`DependencyTracker::scope`]
pub struct DependencyScope<'a> {
    tracker: &'a mut DependencyTracker,
}

impl Deref for DependencyScope<'_> {
    type Target = DependencyTracker;

    fn deref(&self) -> &DependencyTracker {
        self.tracker
    }
}

impl DerefMut for DependencyScope<'_> {
    fn deref_mut(&mut self) -> &mut DependencyTracker {
        self.tracker
    }
}

impl Drop for DependencyScope<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.tracker.exit() {
            warn!("Failed to close dependency frame: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> (Arc<DependencyStore>, DependencyTracker) {
        let store = Arc::new(DependencyStore::new());
        let tracker = DependencyTracker::new(store.clone());
        (store, tracker)
    }

    fn item(identifier: &str) -> DependencyTarget {
        DependencyTarget::Item(Identifier::from(identifier))
    }

    #[test]
    fn test_exit_on_empty_stack_underflows() {
        let (_, mut tracker) = tracker();
        assert!(matches!(
            tracker.exit(),
            Err(CompileError::DependencyStackUnderflow)
        ));
    }

    #[test]
    fn test_records_from_top_frame() {
        let (store, mut tracker) = tracker();
        tracker.enter(Identifier::from("/a.md"));
        tracker.enter(Identifier::from("/b.md"));
        tracker.record_dependency(item("/c.md"), DependencyProps::raw_content());
        tracker.exit().unwrap();
        tracker.record_dependency(item("/d.md"), DependencyProps::attributes());

        assert_eq!(
            store.dependencies_of(&Identifier::from("/b.md")),
            vec![(item("/c.md"), DependencyProps::raw_content())]
        );
        assert_eq!(
            store.dependencies_of(&Identifier::from("/a.md")),
            vec![(item("/d.md"), DependencyProps::attributes())]
        );
    }

    #[test]
    fn test_no_frame_records_nothing() {
        let (store, tracker) = tracker();
        tracker.record_dependency(item("/c.md"), DependencyProps::all());
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn test_self_dependency_ignored() {
        let (store, mut tracker) = tracker();
        tracker.enter(Identifier::from("/a.md"));
        tracker.record_dependency(item("/a.md"), DependencyProps::all());
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn test_repeated_edges_merge_props() {
        let (store, mut tracker) = tracker();
        tracker.enter(Identifier::from("/a.md"));
        tracker.record_dependency(item("/b.md"), DependencyProps::raw_content());
        tracker.record_dependency(item("/b.md"), DependencyProps::attributes());

        let deps = store.dependencies_of(&Identifier::from("/a.md"));
        assert_eq!(deps.len(), 1);
        assert!(deps[0].1.raw_content);
        assert!(deps[0].1.attributes);
        assert!(!deps[0].1.compiled_content);
    }

    #[test]
    fn test_scope_pops_on_drop() {
        let (_, mut tracker) = tracker();
        tracker.enter(Identifier::from("/outer.md"));
        {
            let scope = tracker.scope(Identifier::from("/inner.md"));
            assert_eq!(scope.depth(), 2);
            assert_eq!(scope.current(), Some(&Identifier::from("/inner.md")));
        }
        assert_eq!(tracker.depth(), 1);
        assert_eq!(tracker.current(), Some(&Identifier::from("/outer.md")));
    }

    #[test]
    fn test_scope_pops_when_body_fails() {
        fn failing_body(tracker: &mut DependencyTracker) -> Result<(), CompileError> {
            let _scope = tracker.scope(Identifier::from("/a.md"));
            Err(CompileError::InternalInconsistency("boom".into()))
        }

        let (_, mut tracker) = tracker();
        assert!(failing_body(&mut tracker).is_err());
        assert_eq!(tracker.depth(), 0);
    }

    #[test]
    fn test_store_persists_through_bytes() {
        let store = DependencyStore::new();
        store.record(
            &Identifier::from("/a.md"),
            DependencyTarget::Layout(Identifier::from("/default.html")),
            DependencyProps::all(),
        );

        let restored = DependencyStore::from_bytes(&store.to_bytes().unwrap()).unwrap();

        assert_eq!(
            restored.dependencies_of(&Identifier::from("/a.md")),
            store.dependencies_of(&Identifier::from("/a.md"))
        );
    }
}
