//! Durable compiled content cache
//!
//! Keeps the final snapshots of every representation across runs so that
//! representations that are not outdated can reuse them instead of being
//! recompiled, and persists the dependency graph next to them.

mod compiled_content;
mod error;
mod hash;
mod manager;
mod manifest;

pub use compiled_content::CompiledContentCache;
pub use error::{CacheError, Result};
pub use hash::{build_fingerprint, hash_bytes};
pub use manager::CacheManager;
pub use manifest::{CacheManifest, EntryRecord};

/// Cache format version - increment when cache structure changes
pub const CACHE_VERSION: u32 = 1;

/// Default cache directory name
pub const CACHE_DIR_NAME: &str = ".tessera-cache";

/// Cache manifest file name
pub const MANIFEST_FILE_NAME: &str = "manifest.bin";

/// Cache entries subdirectory name
pub const ENTRIES_DIR_NAME: &str = "entries";

/// Dependency graph file name
pub const DEPENDENCIES_FILE_NAME: &str = "dependencies.bin";
