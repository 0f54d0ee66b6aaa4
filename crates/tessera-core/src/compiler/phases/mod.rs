//! Compilation phases
//!
//! A phase compiles one representation. Phases wrap each other: the cache
//! phase decides whether to reuse cached content and otherwise delegates to
//! the phase it wraps, usually [`RecalculatePhase`].

mod cache;
mod recalculate;

pub use cache::CachePhase;
pub use recalculate::RecalculatePhase;

use crate::errors::CompileError;
use crate::item::ItemRep;

pub trait Phase: Send + Sync {
    /// Compile `rep`; `is_outdated` is the externally computed outdatedness flag
    fn run(&self, rep: &ItemRep, is_outdated: bool) -> Result<(), CompileError>;
}

impl<P: Phase + ?Sized> Phase for Box<P> {
    fn run(&self, rep: &ItemRep, is_outdated: bool) -> Result<(), CompileError> {
        (**self).run(rep, is_outdated)
    }
}

impl<P: Phase + ?Sized> Phase for std::sync::Arc<P> {
    fn run(&self, rep: &ItemRep, is_outdated: bool) -> Result<(), CompileError> {
        (**self).run(rep, is_outdated)
    }
}
