//! Wiring of compiler stores for tests

use std::sync::Arc;
use tessera_core::{
    ActionProvider, CachePhase, CollectingNotificationSink, CompilationContext,
    CompiledContentCache, DependencyStore, FilterRegistry, PlaceholderLayoutRenderer,
    RecalculatePhase, Site, SnapshotRepo,
};

use crate::mocks::{AppendFilter, FailingFilter, IncludeFilter, UpcaseFilter};

/// Shared stores plus the standard mock filters, ready to build phases from
pub struct Harness {
    pub site: Arc<Site>,
    pub snapshot_repo: Arc<SnapshotRepo>,
    pub compiled_content_cache: Arc<CompiledContentCache>,
    pub dependency_store: Arc<DependencyStore>,
    pub notifications: Arc<CollectingNotificationSink>,
    pub filters: FilterRegistry,
}

impl Harness {
    /// Harness over `site` with the filters `upcase`, `append`, `include`
    /// and `explode` (always fails) registered
    pub fn new(site: Site) -> Self {
        let filters = FilterRegistry::new()
            .with("upcase", Arc::new(UpcaseFilter))
            .with("append", Arc::new(AppendFilter))
            .with("include", Arc::new(IncludeFilter))
            .with("explode", Arc::new(FailingFilter::new("kaboom")));

        Self {
            site: Arc::new(site),
            snapshot_repo: Arc::new(SnapshotRepo::new()),
            compiled_content_cache: Arc::new(CompiledContentCache::new()),
            dependency_store: Arc::new(DependencyStore::new()),
            notifications: Arc::new(CollectingNotificationSink::new()),
            filters,
        }
    }

    pub fn context(&self) -> Arc<CompilationContext> {
        Arc::new(CompilationContext::new(
            self.site.clone(),
            self.snapshot_repo.clone(),
            self.filters.clone(),
            Arc::new(PlaceholderLayoutRenderer),
        ))
    }

    pub fn recalculate_phase(&self, action_provider: Arc<dyn ActionProvider>) -> RecalculatePhase {
        RecalculatePhase::new(action_provider, self.dependency_store.clone(), self.context())
    }

    pub fn cache_phase(
        &self,
        action_provider: Arc<dyn ActionProvider>,
    ) -> CachePhase<RecalculatePhase> {
        CachePhase::new(
            self.compiled_content_cache.clone(),
            self.snapshot_repo.clone(),
            self.notifications.clone(),
            self.recalculate_phase(action_provider),
        )
    }
}
