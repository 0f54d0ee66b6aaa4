use thiserror::Error;

use crate::cache::CacheError;
use crate::item::Identifier;

/// Error raised by an external collaborator (filter or layout renderer)
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{item} (rep {rep}): unknown filter `{filter}`")]
    UnknownFilter {
        item: Identifier,
        rep: String,
        filter: String,
    },

    #[error("{item} (rep {rep}): filter `{filter}` failed: {source}")]
    FilterFailed {
        item: Identifier,
        rep: String,
        filter: String,
        #[source]
        source: BoxError,
    },

    #[error("{item} (rep {rep}): unknown layout `{layout}`")]
    UnknownLayout {
        item: Identifier,
        rep: String,
        layout: Identifier,
    },

    #[error("{item} (rep {rep}): layout `{layout}` failed: {source}")]
    LayoutFailed {
        item: Identifier,
        rep: String,
        layout: Identifier,
        #[source]
        source: BoxError,
    },

    #[error("{item} (rep {rep}): cannot apply layout `{layout}` to binary content")]
    CannotLayoutBinary {
        item: Identifier,
        rep: String,
        layout: Identifier,
    },

    #[error("Internal inconsistency: {0}")]
    InternalInconsistency(String),

    #[error("Dependency tracker stack underflow: exit() called with no active frame")]
    DependencyStackUnderflow,

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl CompileError {
    /// Fatal errors signal a broken contract inside the build and abort it;
    /// all others only leave the affected representation uncompiled.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CompileError::InternalInconsistency(_) | CompileError::DependencyStackUnderflow
        )
    }
}
