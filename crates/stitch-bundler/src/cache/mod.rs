//! Incremental transform cache.
//!
//! The transformed source of every module is cached in its own file,
//! `<cache_dir>/<sha256(id)>`. The key depends only on the module id, so a
//! module keeps its cache file across runs and staleness is decided by
//! modification time alone:
//!
//! - no cache file: [`CacheStatus::Missing`]
//! - reload forced, or the source is newer than the cache file:
//!   [`CacheStatus::Stale`]
//! - otherwise: [`CacheStatus::Fresh`]
//!
//! Sources without an on-disk modification time (virtual inputs) are always
//! stale.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use stitch_graph::{Runtime, RuntimeError, RuntimeResult, hash_id};

/// Transformed sources keyed by cache file path.
///
/// Mirrors what is (or should be) on disk under the cache directory.
pub type CacheMap = IndexMap<PathBuf, String>;

/// Cache file for module `id` under `cache_dir`.
pub fn cache_path(id: &str, cache_dir: &Path) -> PathBuf {
    cache_dir.join(hash_id(id))
}

/// Outcome of a cache validity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// The cache file is at least as new as the source.
    Fresh,
    /// No cache file exists yet.
    Missing,
    /// A cache file exists but has to be regenerated.
    Stale,
}

impl CacheStatus {
    pub fn is_fresh(self) -> bool {
        matches!(self, CacheStatus::Fresh)
    }

    /// Progress label logged for a dependency with this status.
    pub fn label(self) -> &'static str {
        match self {
            CacheStatus::Fresh => "Check",
            CacheStatus::Missing => "Create",
            CacheStatus::Stale => "Update",
        }
    }
}

/// Decide whether the cache file at `cache` can stand in for `source`.
pub async fn cache_status(
    runtime: &dyn Runtime,
    source: &Path,
    cache: &Path,
    reload: bool,
) -> RuntimeResult<CacheStatus> {
    if !runtime.exists(cache) {
        return Ok(CacheStatus::Missing);
    }
    if reload {
        return Ok(CacheStatus::Stale);
    }

    let cache_modified = runtime.metadata(cache).await?.modified;
    let source_modified = match runtime.metadata(source).await {
        Ok(metadata) => metadata.modified,
        Err(RuntimeError::FileNotFound(_)) => None,
        Err(e) => return Err(e),
    };

    Ok(match (source_modified, cache_modified) {
        (Some(source), Some(cache)) if source <= cache => CacheStatus::Fresh,
        _ => CacheStatus::Stale,
    })
}

/// Cached text at `cache`, read once and memoized in `cache_map`.
pub async fn read_cached(
    runtime: &dyn Runtime,
    cache: &Path,
    cache_map: &mut CacheMap,
) -> RuntimeResult<String> {
    if let Some(text) = cache_map.get(cache) {
        return Ok(text.clone());
    }

    let bytes = runtime.read_file(cache).await?;
    let text = String::from_utf8(bytes).map_err(|_| {
        RuntimeError::Other(format!(
            "Cache file {} is not valid UTF-8",
            cache.display()
        ))
    })?;
    cache_map.insert(cache.to_path_buf(), text.clone());
    Ok(text)
}
