use std::sync::Arc;
use tracing::{debug, warn};

use super::Phase;
use crate::cache::CompiledContentCache;
use crate::errors::CompileError;
use crate::item::{ItemRep, SnapshotName};
use crate::notifications::{Notification, NotificationSink};
use crate::snapshot_repo::SnapshotRepo;

/// Reuses cached compiled content for representations that are not outdated,
/// and delegates to the wrapped phase (storing its result) otherwise
///
/// | outdated | cache entry | behavior                                      |
/// |----------|-------------|-----------------------------------------------|
/// | yes      | any         | run wrapped, overwrite cache entry            |
/// | no       | hit         | copy entry into snapshot repo, notify         |
/// | no       | miss        | run wrapped, overwrite cache entry            |
///
/// An entry without a `last` snapshot is corrupt and counts as a miss.
/// Reuse never writes to the cache and never enters dependency tracking.
pub struct CachePhase<W: Phase> {
    compiled_content_cache: Arc<CompiledContentCache>,
    snapshot_repo: Arc<SnapshotRepo>,
    notifications: Arc<dyn NotificationSink>,
    wrapped: W,
}

impl<W: Phase> CachePhase<W> {
    pub fn new(
        compiled_content_cache: Arc<CompiledContentCache>,
        snapshot_repo: Arc<SnapshotRepo>,
        notifications: Arc<dyn NotificationSink>,
        wrapped: W,
    ) -> Self {
        Self {
            compiled_content_cache,
            snapshot_repo,
            notifications,
            wrapped,
        }
    }

    pub fn wrapped(&self) -> &W {
        &self.wrapped
    }

    /// Copy the cached entry for `rep` into the snapshot repo; false on a miss
    fn reuse(&self, rep: &ItemRep) -> bool {
        let Some(snapshots) = self.compiled_content_cache.get(rep.identity()) else {
            return false;
        };
        if !snapshots.contains_key(&SnapshotName::last()) {
            warn!(
                "Cache entry for {} has no final content, recompiling",
                rep.identity()
            );
            return false;
        }

        debug!("Using cached content for {}", rep.identity());
        self.snapshot_repo.set_all(rep.identity(), snapshots);
        self.notifications.post(Notification::CachedContentUsed {
            rep: rep.identity().clone(),
        });
        true
    }

    fn recompute(&self, rep: &ItemRep, is_outdated: bool) -> Result<(), CompileError> {
        debug!("Compiling {} (outdated: {})", rep.identity(), is_outdated);
        self.wrapped.run(rep, is_outdated)?;
        if !self.snapshot_repo.has_final_content(rep.identity()) {
            return Err(CompileError::InternalInconsistency(format!(
                "compiling {} produced no final content",
                rep.identity()
            )));
        }

        let snapshots = self.snapshot_repo.get_all(rep.identity());
        self.compiled_content_cache.set(rep.identity().clone(), snapshots);
        Ok(())
    }
}

impl<W: Phase> Phase for CachePhase<W> {
    fn run(&self, rep: &ItemRep, is_outdated: bool) -> Result<(), CompileError> {
        if is_outdated || !self.reuse(rep) {
            self.recompute(rep, is_outdated)?;
        }

        rep.mark_compiled();
        Ok(())
    }
}
