//! Shared test utilities for stitch-bundler tests
//!
//! A `Project` is a temporary directory served through a `TestRuntime`, so
//! module ids and output paths can stay relative.

#![allow(dead_code, clippy::disallowed_methods)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use stitch_bundler::{BundleOptions, BundleResult, write_outputs};
use stitch_graph::TestRuntime;
use tempfile::TempDir;

pub struct Project {
    pub temp: TempDir,
    pub runtime: Arc<TestRuntime>,
}

impl Project {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let runtime = Arc::new(TestRuntime::new(temp.path().to_path_buf()));
        Self { temp, runtime }
    }

    pub fn path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.temp.path().join(rel)
    }

    pub fn write(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Move the modification time of `rel` `secs` seconds into the future.
    pub fn touch_ahead(&self, rel: &str, secs: u64) {
        fs::File::options()
            .write(true)
            .open(self.path(rel))
            .unwrap()
            .set_modified(SystemTime::now() + Duration::from_secs(secs))
            .unwrap();
    }

    /// Quiet default options for this project.
    pub fn options(&self) -> BundleOptions {
        BundleOptions::new(self.runtime.clone()).quiet(true)
    }

    /// Options resuming from `previous`.
    pub fn resume(&self, previous: &BundleResult) -> BundleOptions {
        self.options()
            .graph(previous.graph.clone())
            .file_map(previous.file_map.clone())
    }

    /// Write a build result to disk.
    pub async fn persist(&self, result: &BundleResult) {
        write_outputs(result, self.runtime.as_ref()).await.unwrap();
    }
}

/// Output path of root `id`.
pub fn output_of(result: &BundleResult, id: &str) -> PathBuf {
    result
        .graph
        .get(id)
        .unwrap_or_else(|| panic!("no graph entry for {id}"))
        .output
        .clone()
}

/// Emitted bundle text for root `id`.
pub fn bundle_of<'a>(result: &'a BundleResult, id: &str) -> &'a str {
    let output = output_of(result, id);
    result
        .output_map
        .get(&output)
        .unwrap_or_else(|| panic!("no bundle emitted for {id}"))
}

/// Assert that `parts` occur in `text` in this order.
pub fn assert_in_order(text: &str, parts: &[&str]) {
    let mut from = 0;
    for part in parts {
        match text[from..].find(part) {
            Some(at) => from += at + part.len(),
            None => panic!("expected '{}' after byte {} in:\n{}", part, from, text),
        }
    }
}
