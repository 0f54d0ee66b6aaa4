use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::CompilerOptions;
use crate::dependency::DependencyStore;
use crate::snapshot_repo::Snapshots;

use super::compiled_content::{decode_entry, encode_entry};
use super::{
    build_fingerprint, hash_bytes, CacheError, CacheManifest, CompiledContentCache, EntryRecord,
    Result, CACHE_VERSION, DEPENDENCIES_FILE_NAME, ENTRIES_DIR_NAME, MANIFEST_FILE_NAME,
};

/// Durable backing store for the compiled content cache and dependency graph
///
/// Layout under the cache directory:
/// - `manifest.bin`: version, build fingerprint and rep identity -> entry checksum
/// - `entries/<checksum>.bin`: one serialized snapshot map per entry
/// - `dependencies.bin`: the recorded dependency graph
///
/// All reads are fail-safe: anything missing, corrupted or written by an
/// incompatible build loads as empty instead of failing the build.
pub struct CacheManager {
    /// Base directory for the cache
    cache_dir: PathBuf,

    /// Entries subdirectory
    entries_dir: PathBuf,

    /// Path to manifest file
    manifest_path: PathBuf,

    /// Path to dependency graph file
    dependencies_path: PathBuf,

    /// Fingerprint of the running build
    fingerprint: String,
}

impl CacheManager {
    /// Create a new cache manager
    ///
    /// # Arguments
    /// * `base_dir` - Site root directory
    /// * `config` - Compiler options (cache location)
    pub fn new(base_dir: &Path, config: &CompilerOptions) -> Self {
        let cache_dir = base_dir.join(&config.cache_dir);
        let entries_dir = cache_dir.join(ENTRIES_DIR_NAME);
        let manifest_path = cache_dir.join(MANIFEST_FILE_NAME);
        let dependencies_path = cache_dir.join(DEPENDENCIES_FILE_NAME);

        Self {
            cache_dir,
            entries_dir,
            manifest_path,
            dependencies_path,
            fingerprint: build_fingerprint(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn ensure_cache_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.cache_dir)?;
        std::fs::create_dir_all(&self.entries_dir)?;
        Ok(())
    }

    fn entry_path(&self, checksum: &str) -> PathBuf {
        self.entries_dir.join(format!("{}.bin", checksum))
    }

    fn read_manifest(&self) -> Result<CacheManifest> {
        let bytes = std::fs::read(&self.manifest_path)?;
        let manifest = CacheManifest::from_bytes(&bytes)?;

        if !manifest.is_version_compatible() {
            return Err(CacheError::VersionMismatch {
                expected: CACHE_VERSION,
                found: manifest.version,
            });
        }
        if manifest.fingerprint != self.fingerprint {
            return Err(CacheError::FingerprintMismatch);
        }
        Ok(manifest)
    }

    /// Read one entry, verifying it against the checksum in the manifest
    fn read_entry(&self, record: &EntryRecord) -> Result<Snapshots> {
        let path = self.entry_path(&record.checksum);
        let bytes = std::fs::read(&path)?;
        if hash_bytes(&bytes) != record.checksum {
            return Err(CacheError::CorruptedEntry { path });
        }
        decode_entry(&bytes).map_err(|_| CacheError::CorruptedEntry { path })
    }

    /// Load the compiled content cache from disk
    pub fn load_compiled_content(&self) -> CompiledContentCache {
        let cache = CompiledContentCache::new();

        if !self.manifest_path.exists() {
            info!("No compiled content cache found, starting empty");
            return cache;
        }

        let manifest = match self.read_manifest() {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!("Discarding compiled content cache: {}", e);
                return cache;
            }
        };

        for (rep, record) in &manifest.entries {
            match self.read_entry(record) {
                Ok(snapshots) => cache.set(rep.clone(), snapshots),
                // Treated as a miss; the rep is recompiled and the entry rewritten
                Err(e) => warn!("Skipping cache entry for {}: {}", rep, e),
            }
        }

        info!("Loaded compiled content cache with {} entries", cache.len());
        cache
    }

    /// Write the compiled content cache to disk
    ///
    /// Entry files are content-addressed, so unchanged entries are not
    /// rewritten. Files no longer referenced by the manifest are removed.
    pub fn save_compiled_content(&self, cache: &CompiledContentCache) -> Result<()> {
        self.ensure_cache_dirs()?;

        let mut manifest = CacheManifest::new(self.fingerprint.clone());
        for (rep, snapshots) in cache.entries() {
            let bytes = encode_entry(&snapshots)?;
            let checksum = hash_bytes(&bytes);
            let path = self.entry_path(&checksum);
            if !path.exists() {
                std::fs::write(&path, &bytes)?;
            }
            manifest.insert_entry(rep, EntryRecord::new(checksum));
        }

        std::fs::write(&self.manifest_path, manifest.to_bytes()?)?;
        self.remove_unreferenced_entries(&manifest)?;

        info!(
            "Saved compiled content cache with {} entries",
            manifest.entries.len()
        );
        Ok(())
    }

    fn remove_unreferenced_entries(&self, manifest: &CacheManifest) -> Result<()> {
        let referenced: std::collections::HashSet<PathBuf> = manifest
            .entries
            .values()
            .map(|record| self.entry_path(&record.checksum))
            .collect();

        for dir_entry in std::fs::read_dir(&self.entries_dir)? {
            let path = dir_entry?.path();
            if !referenced.contains(&path) {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    /// Load the dependency graph recorded by previous runs
    pub fn load_dependencies(&self) -> DependencyStore {
        if !self.dependencies_path.exists() {
            return DependencyStore::new();
        }

        match std::fs::read(&self.dependencies_path)
            .map_err(CacheError::from)
            .and_then(|bytes| DependencyStore::from_bytes(&bytes))
        {
            Ok(store) => {
                info!("Loaded dependency graph with {} edges", store.edge_count());
                store
            }
            Err(e) => {
                warn!("Discarding dependency graph: {}", e);
                DependencyStore::new()
            }
        }
    }

    pub fn save_dependencies(&self, store: &DependencyStore) -> Result<()> {
        self.ensure_cache_dirs()?;
        std::fs::write(&self.dependencies_path, store.to_bytes()?)?;
        Ok(())
    }

    /// Clear the entire cache
    pub fn clear(&self) -> Result<()> {
        if self.cache_dir.exists() {
            std::fs::remove_dir_all(&self.cache_dir)?;
        }
        info!("Cache cleared");
        Ok(())
    }
}
