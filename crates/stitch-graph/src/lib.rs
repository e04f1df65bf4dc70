//! # stitch-graph
//!
//! Module dependency graph resolution for the Stitch bundler.
//!
//! Starting from a set of entry modules, [`GraphBuilder`] discovers the full
//! transitive graph over static imports, dynamic imports and re-exports. The
//! edges of each module come from the first [`Loader`] whose predicate claims
//! it; sources are read through a [`SourceResolver`] that memoizes them in an
//! [`InputMap`] and delegates remote URLs to a [`RemoteCache`] collaborator.
//!
//! ## Architecture
//!
//! ```text
//!   entries ──▶ GraphBuilder ──▶ Graph (id → GraphEntry)
//!                   │
//!          ┌────────┴────────┐
//!          ▼                 ▼
//!   SourceResolver      [Loader] (first match)
//!     │       │
//!     ▼       ▼
//!  Runtime  RemoteCache
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stitch_graph::{
//!     EsmLoader, GraphBuilder, GraphState, ImportMap, Loader, NativeRuntime, SourceResolver,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = SourceResolver::new(Arc::new(NativeRuntime));
//! let loaders: Vec<Arc<dyn Loader>> = vec![Arc::new(EsmLoader::new())];
//! let import_map = ImportMap::default();
//!
//! let builder = GraphBuilder::new(&resolver, &loaders, &import_map, "dist/deps");
//! let mut state = GraphState::default();
//! builder.build(&["src/index.js".to_string()], &mut state).await?;
//!
//! for (id, entry) in state.graph.iter() {
//!     println!("{id} -> {}", entry.output.display());
//! }
//! # Ok(()) }
//! ```

pub mod builder;
pub mod graph;
pub mod import_map;
pub mod loader;
pub mod module_id;
pub mod runtime;
pub mod source;

pub use builder::{GraphBuilder, GraphState};
pub use graph::{Exports, FileMap, Graph, GraphEntry, ImportEdge, Imports, InputMap};
pub use import_map::ImportMap;
pub use loader::{EsmLoader, LoadResult, Loader, LoaderContext};
pub use module_id::{hash_id, is_remote, local_path, normalize_id, output_path};
pub use runtime::{FileMetadata, Runtime, RuntimeError, RuntimeResult};
pub use source::{RemoteCache, SourceResolver};

#[cfg(not(target_family = "wasm"))]
pub use runtime::native::NativeRuntime;

#[cfg(any(
    all(test, not(target_family = "wasm")),
    all(feature = "test-utils", not(target_family = "wasm"))
))]
pub use runtime::test_utils::TestRuntime;

/// Errors raised while resolving the module graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A statically declared import does not exist on disk.
    #[error("file '{input}' import not found: '{dependency}'")]
    ImportNotFound { input: String, dependency: String },

    /// A re-export source does not exist on disk.
    #[error("file '{input}' export not found: '{dependency}'")]
    ExportNotFound { input: String, dependency: String },

    /// Reading a module's source failed.
    #[error("Failed to read source of '{id}': {source}")]
    ReadSource {
        id: String,
        #[source]
        source: RuntimeError,
    },

    /// A module's source is not UTF-8 text.
    #[error("Source of '{id}' is not valid UTF-8")]
    InvalidUtf8 { id: String },

    /// A remote module was reached but no remote cache is configured.
    #[error("Remote module '{id}' cannot be loaded without a remote cache")]
    RemoteUnavailable { id: String },

    /// A loader rejected a module.
    #[error("Loader '{loader}' failed on '{id}': {message}")]
    Loader {
        loader: String,
        id: String,
        message: String,
    },

    /// Runtime error outside of source reads.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl GraphError {
    /// Build a [`GraphError::Loader`] for loader implementations.
    pub fn loader(loader: impl Into<String>, id: impl Into<String>, message: impl ToString) -> Self {
        Self::Loader {
            loader: loader.into(),
            id: id.into(),
            message: message.to_string(),
        }
    }

    /// Returns `true` for the fatal missing-import / missing-export conditions.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ImportNotFound { .. } | Self::ExportNotFound { .. }
        )
    }
}

/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;
