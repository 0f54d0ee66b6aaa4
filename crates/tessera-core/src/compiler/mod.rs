//! Build driver
//!
//! Runs the phase pipeline over every representation of a build, keeps going
//! past recoverable failures and persists the caches afterwards.

pub mod phases;

use parking_lot::Mutex;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cache::{CacheManager, CompiledContentCache};
use crate::config::CompilerOptions;
use crate::dependency::DependencyStore;
use crate::errors::CompileError;
use crate::executor::{FilterRegistry, LayoutRenderer};
use crate::item::{ItemRep, RepIdentity, Site};
use crate::snapshot_repo::SnapshotRepo;

use phases::Phase;

/// Shared state the executor works against during a run
pub struct CompilationContext {
    pub site: Arc<Site>,
    pub snapshot_repo: Arc<SnapshotRepo>,
    pub filters: FilterRegistry,
    pub layout_renderer: Arc<dyn LayoutRenderer>,
}

impl CompilationContext {
    pub fn new(
        site: Arc<Site>,
        snapshot_repo: Arc<SnapshotRepo>,
        filters: FilterRegistry,
        layout_renderer: Arc<dyn LayoutRenderer>,
    ) -> Self {
        Self {
            site,
            snapshot_repo,
            filters,
            layout_renderer,
        }
    }
}

/// Decides whether a representation's cached result may be stale
pub trait OutdatednessChecker: Send + Sync {
    fn is_outdated(&self, rep: &ItemRep) -> bool;
}

impl<F> OutdatednessChecker for F
where
    F: Fn(&ItemRep) -> bool + Send + Sync,
{
    fn is_outdated(&self, rep: &ItemRep) -> bool {
        self(rep)
    }
}

/// Treats every representation as outdated, forcing a full rebuild
#[derive(Debug, Default)]
pub struct AlwaysOutdated;

impl OutdatednessChecker for AlwaysOutdated {
    fn is_outdated(&self, _rep: &ItemRep) -> bool {
        true
    }
}

/// A representation that failed to compile
#[derive(Debug)]
pub struct RepFailure {
    pub rep: RepIdentity,
    pub error: CompileError,
}

/// Outcome of compiling a set of representations
#[derive(Debug, Default)]
pub struct CompileReport {
    pub compiled: Vec<RepIdentity>,
    pub failures: Vec<RepFailure>,
}

impl CompileReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Compiler {
    phase: Box<dyn Phase>,
    outdatedness: Arc<dyn OutdatednessChecker>,
    options: CompilerOptions,
    site: Arc<Site>,
    compiled_content_cache: Arc<CompiledContentCache>,
    dependency_store: Arc<DependencyStore>,
    cache_manager: Option<Arc<CacheManager>>,
}

impl Compiler {
    pub fn new(
        phase: Box<dyn Phase>,
        outdatedness: Arc<dyn OutdatednessChecker>,
        options: CompilerOptions,
        site: Arc<Site>,
        compiled_content_cache: Arc<CompiledContentCache>,
        dependency_store: Arc<DependencyStore>,
    ) -> Self {
        Self {
            phase,
            outdatedness,
            options,
            site,
            compiled_content_cache,
            dependency_store,
            cache_manager: None,
        }
    }

    /// Persist caches through `cache_manager` when the run finishes
    pub fn with_cache_manager(mut self, cache_manager: Arc<CacheManager>) -> Self {
        self.cache_manager = Some(cache_manager);
        self
    }

    fn compile_rep(&self, rep: &ItemRep) -> Result<(), CompileError> {
        if rep.is_compiled() {
            return Ok(());
        }
        let is_outdated = self.outdatedness.is_outdated(rep);
        self.phase.run(rep, is_outdated)
    }

    /// Compile every representation in `reps`
    ///
    /// Content errors are collected in the report and the remaining
    /// representations still compile. Fatal errors abort the build.
    pub fn compile(&self, reps: &[ItemRep]) -> Result<CompileReport, CompileError> {
        info!("Compiling {} representation(s)", reps.len());

        let mut report = CompileReport::default();
        if self.options.parallel {
            // A fatal error stops rayon from starting further reps
            let outcomes = Mutex::new(Vec::with_capacity(reps.len()));
            reps.par_iter()
                .enumerate()
                .try_for_each(|(index, rep)| match self.compile_rep(rep) {
                    Err(e) if e.is_fatal() => Err(e),
                    outcome => {
                        outcomes.lock().push((index, outcome));
                        Ok(())
                    }
                })?;

            let mut outcomes = outcomes.into_inner();
            outcomes.sort_by_key(|(index, _)| *index);
            for (index, outcome) in outcomes {
                record_outcome(&mut report, &reps[index], outcome)?;
            }
        } else {
            for rep in reps {
                record_outcome(&mut report, rep, self.compile_rep(rep))?;
            }
        }

        info!(
            "Compiled {} representation(s), {} failed",
            report.compiled.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Prune and persist the compiled content cache and dependency graph
    pub fn finish(&self) -> Result<(), CompileError> {
        if self.options.prune_cache {
            self.compiled_content_cache.prune(&self.site);
        }

        if let Some(cache_manager) = &self.cache_manager {
            cache_manager.save_compiled_content(&self.compiled_content_cache)?;
            cache_manager.save_dependencies(&self.dependency_store)?;
        }
        Ok(())
    }
}

fn record_outcome(
    report: &mut CompileReport,
    rep: &ItemRep,
    outcome: Result<(), CompileError>,
) -> Result<(), CompileError> {
    match outcome {
        Ok(()) => report.compiled.push(rep.identity().clone()),
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            warn!("Failed to compile {}: {}", rep.identity(), e);
            report.failures.push(RepFailure {
                rep: rep.identity().clone(),
                error: e,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Content;
    use crate::item::{Attributes, Item, SnapshotName};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPhase {
        runs: AtomicUsize,
    }

    impl Phase for CountingPhase {
        fn run(&self, rep: &ItemRep, _is_outdated: bool) -> Result<(), CompileError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            match rep.item().identifier().as_str() {
                "/broken.md" => Err(CompileError::UnknownFilter {
                    item: rep.item().identifier().clone(),
                    rep: rep.name().to_string(),
                    filter: "nope".into(),
                }),
                "/fatal.md" => Err(CompileError::InternalInconsistency("bad".into())),
                _ => {
                    rep.mark_compiled();
                    Ok(())
                }
            }
        }
    }

    fn compiler(site: Site, phase: Arc<CountingPhase>, parallel: bool) -> Compiler {
        let options = CompilerOptions {
            parallel,
            ..CompilerOptions::default()
        };
        Compiler::new(
            Box::new(phase),
            Arc::new(AlwaysOutdated),
            options,
            Arc::new(site),
            Arc::new(CompiledContentCache::new()),
            Arc::new(DependencyStore::new()),
        )
    }

    fn reps(site: &Site) -> Vec<ItemRep> {
        site.items()
            .map(|item| ItemRep::new(item.clone(), "default"))
            .collect()
    }

    fn site(identifiers: &[&str]) -> Site {
        identifiers.iter().fold(Site::new(), |site, identifier| {
            site.with_item(Item::new("x", Attributes::new(), *identifier))
        })
    }

    #[test]
    fn test_recoverable_failure_does_not_stop_other_reps() {
        for parallel in [false, true] {
            let site = site(&["/a.md", "/broken.md", "/b.md"]);
            let phase = Arc::new(CountingPhase {
                runs: AtomicUsize::new(0),
            });
            let compiler = compiler(site.clone(), phase.clone(), parallel);

            let report = compiler.compile(&reps(&site)).unwrap();

            assert_eq!(phase.runs.load(Ordering::SeqCst), 3);
            assert_eq!(report.compiled.len(), 2);
            assert_eq!(report.failures.len(), 1);
            assert_eq!(report.failures[0].rep.item.as_str(), "/broken.md");
            assert!(!report.is_success());
        }
    }

    #[test]
    fn test_fatal_failure_aborts() {
        let site = site(&["/fatal.md", "/a.md"]);
        let phase = Arc::new(CountingPhase {
            runs: AtomicUsize::new(0),
        });
        let compiler = compiler(site.clone(), phase.clone(), false);

        let result = compiler.compile(&reps(&site));

        assert!(matches!(result, Err(CompileError::InternalInconsistency(_))));
        assert_eq!(phase.runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fatal_failure_aborts_parallel_build() {
        let identifiers: Vec<String> = std::iter::once("/fatal.md".to_string())
            .chain((0..2000).map(|i| format!("/page-{}.md", i)))
            .collect();
        let identifiers: Vec<&str> = identifiers.iter().map(String::as_str).collect();
        let site = site(&identifiers);
        let phase = Arc::new(CountingPhase {
            runs: AtomicUsize::new(0),
        });
        let compiler = compiler(site.clone(), phase.clone(), true);
        let reps = reps(&site);

        let result = compiler.compile(&reps);

        assert!(matches!(result, Err(CompileError::InternalInconsistency(_))));
        assert!(!reps[0].is_compiled());
    }

    #[test]
    fn test_parallel_report_keeps_input_order() {
        let site = site(&["/a.md", "/broken.md", "/b.md", "/c.md"]);
        let phase = Arc::new(CountingPhase {
            runs: AtomicUsize::new(0),
        });
        let compiler = compiler(site.clone(), phase, true);

        let report = compiler.compile(&reps(&site)).unwrap();

        let compiled: Vec<_> = report.compiled.iter().map(|rep| rep.item.as_str()).collect();
        assert_eq!(compiled, vec!["/a.md", "/b.md", "/c.md"]);
        assert_eq!(report.failures[0].rep.item.as_str(), "/broken.md");
    }

    #[test]
    fn test_already_compiled_reps_are_skipped() {
        let site = site(&["/a.md"]);
        let phase = Arc::new(CountingPhase {
            runs: AtomicUsize::new(0),
        });
        let compiler = compiler(site.clone(), phase.clone(), false);
        let reps = reps(&site);

        compiler.compile(&reps).unwrap();
        compiler.compile(&reps).unwrap();

        assert_eq!(phase.runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_finish_prunes_removed_items() {
        let site = site(&["/a.md"]);
        let phase = Arc::new(CountingPhase {
            runs: AtomicUsize::new(0),
        });
        let compiler = compiler(site, phase, false);
        let mut snapshots = crate::snapshot_repo::Snapshots::new();
        snapshots.insert(SnapshotName::last(), Content::text("old"));
        compiler
            .compiled_content_cache
            .set(RepIdentity::new("/deleted.md", "default"), snapshots);

        compiler.finish().unwrap();

        assert!(compiler.compiled_content_cache.is_empty());
    }
}
