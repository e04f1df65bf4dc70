#![cfg_attr(docsrs, feature(doc_cfg))]

//! # stitch-bundler
//!
//! Incremental bundle assembly on top of the `stitch-graph` foundation.
//!
//! Every entry (and every dynamically imported module, as its own root) is
//! assembled into one self-contained bundle: a module-system preamble, the
//! transformed source of each module in its static closure, and an
//! instantiate/export footer. Transformed module sources are cached per
//! module; a bundle is only re-emitted when something in its closure had to
//! be regenerated or its output file is gone.
//!
//! The build itself never writes to disk. It returns what should be written
//! and [`write_outputs`] persists it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use stitch_bundler::{BundleOptions, NativeRuntime, bundle, entries, write_outputs};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = BundleOptions::new(Arc::new(NativeRuntime)).out_dir("dist");
//! let result = bundle(entries(["src/index.js"]), options).await?;
//!
//! for output in result.output_map.keys() {
//!     println!("emit {}", output.display());
//! }
//! write_outputs(&result, &NativeRuntime).await?;
//! # Ok(()) }
//! ```
//!
//! ### Loading options from `stitch.toml`
//!
//! ```no_run
//! use std::sync::Arc;
//! use stitch_bundler::{BundleOptions, NativeRuntime, StitchConfig, bundle, entries};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StitchConfig::load(".")?;
//! let options = BundleOptions::from_config(&config, Arc::new(NativeRuntime)).await?;
//! let result = bundle(entries(["src/index.js"]), options).await?;
//! println!("{} bundles emitted", result.stats.bundled);
//! # Ok(()) }
//! ```

// Re-export everything from foundation crate
pub use stitch_graph::*;

pub mod bundle;
pub mod cache;
pub mod config;
pub mod logging;
pub mod output;
pub mod plugins;
pub mod system;

pub use logging::LogLevel;

// Subscriber setup (optional, enabled with "logging" feature)
#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub use logging::{init_logging, init_logging_from_config};

pub use bundle::{BundleOptions, BundleResult, BundleStats, OutputMap, bundle, entries};
pub use cache::{CacheMap, CacheStatus, cache_path};
pub use config::StitchConfig;
pub use output::write_outputs;
pub use plugins::{Plugin, PluginContext, plugin_fn};
pub use system::{ModuleSystem, SystemShim};

/// Error types for stitch-bundler operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error from graph resolution, including missing imports and exports.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Runtime I/O error outside of graph resolution.
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// A transformer or optimizer failed.
    #[error("Plugin '{plugin}' failed on '{id}': {message}")]
    Plugin {
        plugin: String,
        id: String,
        message: String,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// File write operation failed.
    #[error("Write failure: {0}")]
    WriteFailure(String),
}

/// Result type alias for stitch-bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build an [`Error::Plugin`] for plugin implementations.
    pub fn plugin(plugin: impl Into<String>, id: impl Into<String>, message: impl ToString) -> Self {
        Error::Plugin {
            plugin: plugin.into(),
            id: id.into(),
            message: message.to_string(),
        }
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Graph(GraphError::ImportNotFound { .. }) => "IMPORT_NOT_FOUND",
            Error::Graph(GraphError::ExportNotFound { .. }) => "EXPORT_NOT_FOUND",
            Error::Graph(_) => "GRAPH_ERROR",
            Error::Runtime(_) => "RUNTIME_ERROR",
            Error::Plugin { .. } => "PLUGIN_ERROR",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::WriteFailure(_) => "WRITE_FAILURE",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::Graph(GraphError::ImportNotFound { input, dependency }) => {
                Some(Box::new(format!(
                    "'{}' imports '{}', which does not exist on disk.\nCheck the specifier or add an import map entry for it.",
                    input, dependency
                )))
            }
            Error::Graph(GraphError::ExportNotFound { input, dependency }) => {
                Some(Box::new(format!(
                    "'{}' re-exports from '{}', which does not exist on disk.",
                    input, dependency
                )))
            }
            Error::Graph(GraphError::RemoteUnavailable { id }) => Some(Box::new(format!(
                "'{}' is a remote module. Configure a remote cache to bundle it.",
                id
            ))),
            Error::InvalidConfig(msg) => Some(Box::new(format!(
                "Check your configuration file for syntax errors.\nError: {}",
                msg
            ))),
            Error::WriteFailure(msg) => Some(Box::new(format!(
                "Failed to write file. Check disk space and permissions.\nError: {}",
                msg
            ))),
            _ => None,
        }
    }
}
