use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Cache version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("Cache written by a different tessera build (cache invalidated)")]
    FingerprintMismatch,

    #[error("Corrupted cache entry: {path}")]
    CorruptedEntry { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, CacheError>;
