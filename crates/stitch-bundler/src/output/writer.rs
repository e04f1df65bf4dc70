//! Writes a [`BundleResult`] to disk through a [`Runtime`].
//!
//! Output and cache paths are used as-is; relative paths resolve the way the
//! runtime resolves them. Parent directories are created as needed.

use std::path::Path;

use stitch_graph::Runtime;
use tracing::debug;

use crate::bundle::BundleResult;
use crate::{Error, Result};

/// Write every output-map and cache-map entry of `result`.
///
/// Stops at the first failure; files already written are left in place.
///
/// ```no_run
/// use std::sync::Arc;
/// use stitch_bundler::{BundleOptions, NativeRuntime, bundle, entries, write_outputs};
///
/// # async fn example() -> stitch_bundler::Result<()> {
/// let result = bundle(entries(["src/index.js"]), BundleOptions::new(Arc::new(NativeRuntime))).await?;
/// write_outputs(&result, &NativeRuntime).await?;
/// # Ok(())
/// # }
/// ```
pub async fn write_outputs(result: &BundleResult, runtime: &dyn Runtime) -> Result<()> {
    for (path, text) in result.output_map.iter().chain(result.cache_map.iter()) {
        write_file(runtime, path, text).await?;
    }
    Ok(())
}

async fn write_file(runtime: &dyn Runtime, path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !runtime.exists(parent) {
            runtime.create_dir(parent, true).await.map_err(|e| {
                Error::WriteFailure(format!(
                    "Failed to create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    runtime
        .write_file(path, text.as_bytes())
        .await
        .map_err(|e| Error::WriteFailure(format!("Failed to write '{}': {}", path.display(), e)))?;
    debug!(path = %path.display(), bytes = text.len(), "wrote file");
    Ok(())
}
