//! Native Runtime Implementation
//!
//! Provides a `Runtime` implementation for native (non-WASM) environments
//! where standard filesystem operations are available.
//!
//! ```text
//! Rust (Native)
//! ┌─────────────────┐
//! │ NativeRuntime   │
//! │  .read_file()   │────▶ std::fs::read()
//! │  .metadata()    │────▶ std::fs::metadata()
//! │  .exists()      │────▶ std::path::Path::exists()
//! └─────────────────┘
//!          │
//!          ▼
//!   ┌──────────────┐
//!   │ OS Filesystem│
//!   └──────────────┘
//! ```

// NativeRuntime is platform-specific and wraps std::fs
#![allow(clippy::disallowed_methods)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::task;

use super::{FileMetadata, Runtime, RuntimeError, RuntimeResult};

/// Native filesystem Runtime implementation using `std::fs`.
///
/// Blocking `std::fs` calls run on tokio's blocking pool via
/// `spawn_blocking`, so awaiting them never stalls the executor.
#[derive(Debug, Clone, Copy)]
pub struct NativeRuntime;

impl NativeRuntime {
    /// Create a new NativeRuntime instance.
    pub fn new() -> Self {
        Self
    }
}

impl Default for NativeRuntime {
    fn default() -> Self {
        Self::new()
    }
}

fn join_error(e: task::JoinError) -> RuntimeError {
    RuntimeError::Other(format!("Task join error: {}", e))
}

#[async_trait]
impl Runtime for NativeRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        let path = path.to_path_buf();

        task::spawn_blocking(move || {
            std::fs::read(&path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RuntimeError::FileNotFound(path.clone())
                } else {
                    RuntimeError::Io(format!("Failed to read {}: {}", path.display(), e))
                }
            })
        })
        .await
        .map_err(join_error)?
    }

    async fn write_file(&self, path: &Path, content: &[u8]) -> RuntimeResult<()> {
        let path = path.to_path_buf();
        let content = content.to_vec();

        task::spawn_blocking(move || {
            std::fs::write(&path, content)
                .map_err(|e| RuntimeError::Io(format!("Failed to write {}: {}", path.display(), e)))
        })
        .await
        .map_err(join_error)?
    }

    async fn metadata(&self, path: &Path) -> RuntimeResult<FileMetadata> {
        let path = path.to_path_buf();

        task::spawn_blocking(move || {
            let metadata = std::fs::metadata(&path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RuntimeError::FileNotFound(path.clone())
                } else {
                    RuntimeError::Io(format!(
                        "Failed to get metadata for {}: {}",
                        path.display(),
                        e
                    ))
                }
            })?;

            let modified = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as u64);

            Ok(FileMetadata {
                size: metadata.len(),
                is_dir: metadata.is_dir(),
                is_file: metadata.is_file(),
                modified,
            })
        })
        .await
        .map_err(join_error)?
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    async fn create_dir(&self, path: &Path, recursive: bool) -> RuntimeResult<()> {
        let path = path.to_path_buf();

        task::spawn_blocking(move || {
            let result = if recursive {
                std::fs::create_dir_all(&path)
            } else {
                std::fs::create_dir(&path)
            };

            result.map_err(|e| {
                RuntimeError::Io(format!(
                    "Failed to create directory {}: {}",
                    path.display(),
                    e
                ))
            })
        })
        .await
        .map_err(join_error)?
    }

    fn get_cwd(&self) -> RuntimeResult<PathBuf> {
        std::env::current_dir().map_err(|e| {
            RuntimeError::Io(format!("Failed to get current working directory: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_write_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("a.js");

        let runtime = NativeRuntime::new();
        runtime.write_file(&file_path, b"export const a = 1;").await.unwrap();

        let read_content = runtime.read_file(&file_path).await.unwrap();
        assert_eq!(read_content, b"export const a = 1;");
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let runtime = NativeRuntime::new();

        let err = runtime
            .read_file(&temp_dir.path().join("missing.js"))
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_metadata_reports_modified_millis() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("a.js");
        fs::write(&file_path, b"test content").unwrap();

        let stamp = UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
        fs::File::options()
            .write(true)
            .open(&file_path)
            .unwrap()
            .set_modified(stamp)
            .unwrap();

        let metadata = NativeRuntime::new().metadata(&file_path).await.unwrap();
        assert!(metadata.is_file);
        assert!(!metadata.is_dir);
        assert_eq!(metadata.size, 12);
        assert_eq!(metadata.modified, Some(1_700_000_000_123));
    }

    #[tokio::test]
    async fn test_create_dir_recursive() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("dist").join("deps");

        let runtime = NativeRuntime::new();
        runtime.create_dir(&nested_path, true).await.unwrap();

        assert!(runtime.exists(&nested_path));
        assert!(nested_path.is_dir());
    }
}
