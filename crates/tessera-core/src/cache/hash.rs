use super::CACHE_VERSION;

/// Compute the Blake3 hash of raw bytes as a hex string
pub fn hash_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Fingerprint of everything that can change what a compilation produces
///
/// Compiler options only steer scheduling and storage (`parallel`,
/// `prune_cache`, `cache_dir`) and are left out, so toggling them keeps the
/// cache. A different tessera release or cache format invalidates it.
pub fn build_fingerprint() -> String {
    let build = format!(
        "tessera-core {} cache v{}",
        env!("CARGO_PKG_VERSION"),
        CACHE_VERSION
    );
    hash_bytes(build.as_bytes())
}
