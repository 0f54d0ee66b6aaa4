use std::sync::Arc;
use tracing::debug;

use super::Phase;
use crate::action::{ActionProvider, ProcessingAction};
use crate::compiler::CompilationContext;
use crate::dependency::{DependencyStore, DependencyTracker};
use crate::errors::CompileError;
use crate::executor::Executor;
use crate::item::{ItemRep, SnapshotName};

/// (Re)calculates the content of a representation, without caching or
/// outdatedness checking
pub struct RecalculatePhase {
    action_provider: Arc<dyn ActionProvider>,
    dependency_store: Arc<DependencyStore>,
    context: Arc<CompilationContext>,
}

impl RecalculatePhase {
    pub fn new(
        action_provider: Arc<dyn ActionProvider>,
        dependency_store: Arc<DependencyStore>,
        context: Arc<CompilationContext>,
    ) -> Self {
        Self {
            action_provider,
            dependency_store,
            context,
        }
    }

    /// Recompute `rep` with dependencies recorded through `tracker`
    ///
    /// A frame for the rep's item is pushed onto `tracker` for the duration of
    /// the call and popped on every exit path, so the tracker's depth is the
    /// same before and after.
    pub fn run_with_tracker(
        &self,
        rep: &ItemRep,
        tracker: &mut DependencyTracker,
    ) -> Result<(), CompileError> {
        let scope = tracker.scope(rep.item().identifier().clone());

        self.context.snapshot_repo.set(
            rep.identity(),
            SnapshotName::last(),
            rep.item().content().clone(),
        );

        let actions = self.action_provider.memory_for(rep);
        debug!("Recalculating {} ({} actions)", rep.identity(), actions.len());

        let mut executor = Executor::new(rep, &self.context, &scope);
        for action in &actions {
            match action {
                ProcessingAction::Filter { name, params } => executor.filter(name, params)?,
                ProcessingAction::Layout { identifier, params } => {
                    executor.layout(identifier, params)?
                }
                ProcessingAction::Snapshot { name } => executor.snapshot(name),
                ProcessingAction::Unrecognized => {
                    return Err(CompileError::InternalInconsistency(format!(
                        "unknown action {:?} for {}",
                        action,
                        rep.identity()
                    )))
                }
            }
        }

        Ok(())
    }
}

impl Phase for RecalculatePhase {
    /// Always recomputes; outdatedness is decided by the wrapping phase
    fn run(&self, rep: &ItemRep, _is_outdated: bool) -> Result<(), CompileError> {
        let mut tracker = DependencyTracker::new(self.dependency_store.clone());
        self.run_with_tracker(rep, &mut tracker)
    }
}
