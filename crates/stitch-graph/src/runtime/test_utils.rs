//! Test utilities for stitch crates.
//!
//! `TestRuntime` is a filesystem runtime rooted at a temporary directory.
//! Relative paths resolve against that root instead of the process working
//! directory, so tests can use short module identifiers like `src/a.js`
//! without changing the cwd of the whole test binary.

// Test utilities are allowed to use std::fs since they only run on native platforms
#![allow(clippy::disallowed_methods)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{FileMetadata, Runtime, RuntimeError, RuntimeResult};

/// Simple test runtime that wraps std::fs for native tests.
///
/// It also counts `read_file` calls so tests can assert that cached work was
/// not repeated.
///
/// ```rust,ignore
/// use stitch_graph::runtime::test_utils::TestRuntime;
/// use stitch_graph::Runtime;
/// use tempfile::TempDir;
///
/// # #[tokio::main]
/// # async fn main() {
/// let temp = TempDir::new().unwrap();
/// let runtime = TestRuntime::new(temp.path().to_path_buf());
///
/// std::fs::write(temp.path().join("a.js"), b"export {};").unwrap();
/// let content = runtime.read_file(std::path::Path::new("a.js")).await.unwrap();
/// assert_eq!(content, b"export {};");
/// assert_eq!(runtime.reads(), 1);
/// # }
/// ```
#[derive(Debug)]
pub struct TestRuntime {
    cwd: PathBuf,
    reads: AtomicUsize,
}

impl TestRuntime {
    /// Create a new test runtime rooted at `cwd`.
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            cwd,
            reads: AtomicUsize::new(0),
        }
    }

    /// Number of `read_file` calls served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn rooted(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}

#[async_trait]
impl Runtime for TestRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let path = self.rooted(path);
        std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RuntimeError::FileNotFound(path.clone())
            } else {
                RuntimeError::Io(e.to_string())
            }
        })
    }

    async fn write_file(&self, path: &Path, content: &[u8]) -> RuntimeResult<()> {
        std::fs::write(self.rooted(path), content).map_err(|e| RuntimeError::Io(e.to_string()))
    }

    async fn metadata(&self, path: &Path) -> RuntimeResult<FileMetadata> {
        let path = self.rooted(path);
        let metadata = std::fs::metadata(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RuntimeError::FileNotFound(path.clone())
            } else {
                RuntimeError::Io(e.to_string())
            }
        })?;
        Ok(FileMetadata {
            size: metadata.len(),
            is_file: metadata.is_file(),
            is_dir: metadata.is_dir(),
            modified: metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as u64),
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.rooted(path).exists()
    }

    async fn create_dir(&self, path: &Path, recursive: bool) -> RuntimeResult<()> {
        let path = self.rooted(path);
        if recursive {
            std::fs::create_dir_all(path).map_err(|e| RuntimeError::Io(e.to_string()))
        } else {
            std::fs::create_dir(path).map_err(|e| RuntimeError::Io(e.to_string()))
        }
    }

    fn get_cwd(&self) -> RuntimeResult<PathBuf> {
        Ok(self.cwd.clone())
    }
}
