use crate::action::ActionProvider;
use crate::cache::{CacheManager, CompiledContentCache};
use crate::compiler::phases::{CachePhase, RecalculatePhase};
use crate::compiler::{CompilationContext, Compiler, OutdatednessChecker};
use crate::config::TesseraConfig;
use crate::dependency::DependencyStore;
use crate::errors::CompileError;
use crate::executor::{FilterRegistry, LayoutRenderer};
use crate::item::Site;
use crate::notifications::{NotificationSink, TracingNotificationSink};
use crate::snapshot_repo::SnapshotRepo;
use std::path::Path;
use std::sync::Arc;

/// The collaborators a build plugs into the compiler
pub struct BuildInputs {
    pub site: Arc<Site>,
    pub action_provider: Arc<dyn ActionProvider>,
    pub filters: FilterRegistry,
    pub layout_renderer: Arc<dyn LayoutRenderer>,
    pub outdatedness: Arc<dyn OutdatednessChecker>,
}

/// Dependency injection container
/// Manages all shared stores and creates a compiler with proper wiring
pub struct Container {
    config: Arc<TesseraConfig>,
    notifications: Arc<dyn NotificationSink>,
    snapshot_repo: Arc<SnapshotRepo>,
    compiled_content_cache: Arc<CompiledContentCache>,
    dependency_store: Arc<DependencyStore>,
    cache_manager: Option<Arc<CacheManager>>,
}

impl Container {
    /// Create a new container with production dependencies
    ///
    /// The compiled content cache and dependency graph are loaded from the
    /// cache directory under `base_dir`.
    pub fn new(config: TesseraConfig, base_dir: &Path) -> Self {
        let config = Arc::new(config);
        let cache_manager = Arc::new(CacheManager::new(base_dir, &config.compiler_options));

        Container {
            notifications: Arc::new(TracingNotificationSink::new()),
            snapshot_repo: Arc::new(SnapshotRepo::new()),
            compiled_content_cache: Arc::new(cache_manager.load_compiled_content()),
            dependency_store: Arc::new(cache_manager.load_dependencies()),
            cache_manager: Some(cache_manager),
            config,
        }
    }

    /// Create a container with custom dependencies and no durable storage (for testing)
    pub fn with_dependencies(
        config: TesseraConfig,
        notifications: Arc<dyn NotificationSink>,
        compiled_content_cache: Arc<CompiledContentCache>,
        dependency_store: Arc<DependencyStore>,
    ) -> Self {
        Container {
            config: Arc::new(config),
            notifications,
            snapshot_repo: Arc::new(SnapshotRepo::new()),
            compiled_content_cache,
            dependency_store,
            cache_manager: None,
        }
    }

    pub fn config(&self) -> &Arc<TesseraConfig> {
        &self.config
    }

    pub fn snapshot_repo(&self) -> &Arc<SnapshotRepo> {
        &self.snapshot_repo
    }

    pub fn compiled_content_cache(&self) -> &Arc<CompiledContentCache> {
        &self.compiled_content_cache
    }

    pub fn dependency_store(&self) -> &Arc<DependencyStore> {
        &self.dependency_store
    }

    /// Build the phase pipeline (cache phase wrapping recalculation) for a run
    pub fn compiler(&self, inputs: BuildInputs) -> Compiler {
        let context = Arc::new(CompilationContext::new(
            inputs.site.clone(),
            self.snapshot_repo.clone(),
            inputs.filters,
            inputs.layout_renderer,
        ));
        let recalculate = RecalculatePhase::new(
            inputs.action_provider,
            self.dependency_store.clone(),
            context,
        );
        let phase = CachePhase::new(
            self.compiled_content_cache.clone(),
            self.snapshot_repo.clone(),
            self.notifications.clone(),
            recalculate,
        );

        let compiler = Compiler::new(
            Box::new(phase),
            inputs.outdatedness,
            self.config.compiler_options.clone(),
            inputs.site,
            self.compiled_content_cache.clone(),
            self.dependency_store.clone(),
        );
        match &self.cache_manager {
            Some(cache_manager) => compiler.with_cache_manager(cache_manager.clone()),
            None => compiler,
        }
    }

    /// Remove the durable cache from disk; the current in-memory state is kept
    pub fn clear_cache(&self) -> Result<(), CompileError> {
        if let Some(cache_manager) = &self.cache_manager {
            cache_manager.clear()?;
        }
        Ok(())
    }
}
