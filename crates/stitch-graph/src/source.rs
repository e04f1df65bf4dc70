//! Source resolution.
//!
//! Turns a module identifier into raw source text. Local identifiers are read
//! through the [`Runtime`]; remote identifiers are first materialized into a
//! local cache by a [`RemoteCache`] and then read from there. Every result is
//! memoized in the caller's [`InputMap`], which also lets the caller override
//! sources (virtual files) before a build starts.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::graph::InputMap;
use crate::import_map::ImportMap;
use crate::module_id::{is_remote, local_path};
use crate::runtime::{Runtime, RuntimeResult};
use crate::{GraphError, Result};

/// Fetch-and-cache collaborator for remote modules.
///
/// Fetching over the network and the layout of the local copy are the
/// implementation's concern; the graph only needs the local path afterwards.
#[async_trait]
pub trait RemoteCache: Send + Sync + std::fmt::Debug {
    /// Make sure a local copy of `url` exists.
    async fn cache(&self, url: &str, import_map: &ImportMap) -> RuntimeResult<()>;

    /// Local path of the cached copy of `url`.
    fn resolve(&self, url: &str) -> PathBuf;
}

/// Reads module sources through a runtime, with optional remote support.
#[derive(Debug, Clone)]
pub struct SourceResolver {
    runtime: Arc<dyn Runtime>,
    remote: Option<Arc<dyn RemoteCache>>,
}

impl SourceResolver {
    pub fn new(runtime: Arc<dyn Runtime>) -> Self {
        Self {
            runtime,
            remote: None,
        }
    }

    /// Attach a remote cache used for `scheme://` identifiers.
    pub fn with_remote(mut self, remote: Arc<dyn RemoteCache>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn runtime(&self) -> &Arc<dyn Runtime> {
        &self.runtime
    }

    /// Filesystem path the source of `id` lives at.
    pub fn resolve_path(&self, id: &str) -> Result<PathBuf> {
        if is_remote(id) {
            return Ok(self.remote(id)?.resolve(id));
        }
        Ok(local_path(id, &self.runtime.get_cwd()?))
    }

    /// `true` if `id` is remote or exists on disk.
    ///
    /// Remote identifiers are never checked; their availability is the
    /// remote cache's problem.
    pub fn is_available(&self, id: &str) -> Result<bool> {
        if is_remote(id) {
            return Ok(true);
        }
        let path = local_path(id, &self.runtime.get_cwd()?);
        Ok(self.runtime.exists(&path))
    }

    /// Raw source text of `id`, memoized in `input_map`.
    ///
    /// An empty `input_map` value counts as unset, so callers can list
    /// entries without providing their sources.
    pub async fn source(
        &self,
        id: &str,
        input_map: &mut InputMap,
        import_map: &ImportMap,
    ) -> Result<String> {
        if let Some(source) = input_map.get(id).filter(|source| !source.is_empty()) {
            return Ok(source.clone());
        }

        let path = if is_remote(id) {
            let remote = self.remote(id)?;
            remote
                .cache(id, import_map)
                .await
                .map_err(|source| GraphError::ReadSource {
                    id: id.to_string(),
                    source,
                })?;
            remote.resolve(id)
        } else {
            local_path(id, &self.runtime.get_cwd()?)
        };

        let bytes = self
            .runtime
            .read_file(&path)
            .await
            .map_err(|source| GraphError::ReadSource {
                id: id.to_string(),
                source,
            })?;
        let text = String::from_utf8(bytes).map_err(|_| GraphError::InvalidUtf8 {
            id: id.to_string(),
        })?;

        input_map.insert(id.to_string(), text.clone());
        Ok(text)
    }

    fn remote(&self, id: &str) -> Result<&Arc<dyn RemoteCache>> {
        self.remote.as_ref().ok_or_else(|| GraphError::RemoteUnavailable {
            id: id.to_string(),
        })
    }
}
