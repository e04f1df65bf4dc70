//! Module identifiers and the paths derived from them.
//!
//! A module identifier is an opaque string: a local path (relative to the
//! runtime's working directory, or absolute) or a remote URL. Output and
//! cache locations are pure functions of the identifier, never of content,
//! so the same identifier lands on the same file across runs.

use std::path::{Path, PathBuf};

use path_clean::PathClean;
use sha2::{Digest, Sha256};

use crate::graph::FileMap;

/// Extension given to every emitted bundle file.
pub const OUTPUT_EXTENSION: &str = "js";

/// Returns `true` if `id` names a remote module (`scheme://...`).
///
/// ```
/// use stitch_graph::is_remote;
///
/// assert!(is_remote("https://deno.land/std/path/mod.ts"));
/// assert!(!is_remote("./src/index.js"));
/// assert!(!is_remote("C:\\src\\index.js"));
/// ```
pub fn is_remote(id: &str) -> bool {
    let Some((scheme, rest)) = id.split_once("://") else {
        return false;
    };

    let mut chars = scheme.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    starts_alpha
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && !rest.is_empty()
}

/// SHA-256 of the identifier, hex encoded.
pub fn hash_id(id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(id.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Look up (or assign) the output path of `id`.
///
/// A pre-seeded `file_map` entry wins; otherwise the path is
/// `<base>/<sha256(id)>.js` and is recorded in the map.
pub fn output_path(id: &str, file_map: &mut FileMap, base: &Path) -> PathBuf {
    file_map
        .entry(id.to_string())
        .or_insert_with(|| base.join(format!("{}.{}", hash_id(id), OUTPUT_EXTENSION)))
        .clone()
}

/// Lexically clean a local identifier (`./src/../a.js` → `a.js`).
///
/// Loaders produce cleaned ids for the modules they discover; entries given
/// by the caller go through this so the same file never gets two ids.
/// Remote identifiers are returned unchanged.
pub fn normalize_id(id: &str) -> String {
    if is_remote(id) {
        return id.to_string();
    }
    Path::new(id).clean().to_string_lossy().into_owned()
}

/// Resolve a local identifier against `cwd` and clean `.`/`..` components.
pub fn local_path(id: &str, cwd: &Path) -> PathBuf {
    let path = Path::new(id);
    if path.is_absolute() {
        path.to_path_buf().clean()
    } else {
        cwd.join(path).clean()
    }
}
