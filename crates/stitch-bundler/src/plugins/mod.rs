//! Transformer and optimizer plugins.
//!
//! Both kinds share one capability: a predicate over a module id and a
//! text-to-text transform. Transformers run on a single module's source
//! before it is cached; optimizers run on a finished bundle. In both cases
//! every matching plugin is applied, in list order, each one consuming the
//! previous one's output.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use stitch_graph::{FileMap, Graph, ImportMap};

/// Build state visible to plugins.
#[derive(Debug, Clone, Copy)]
pub struct PluginContext<'a> {
    pub graph: &'a Graph,
    pub file_map: &'a FileMap,
    pub import_map: &'a ImportMap,
    pub out_dir: &'a Path,
    pub deps_dir: &'a Path,
}

/// A text transform applied to the ids it claims.
#[async_trait]
pub trait Plugin: Send + Sync + fmt::Debug {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Whether this plugin applies to `id`.
    fn test(&self, id: &str) -> bool;

    /// Transform `text` belonging to `id`.
    async fn apply(&self, id: &str, text: String, ctx: &PluginContext<'_>) -> Result<String>;
}

type TestFn = dyn Fn(&str) -> bool + Send + Sync;
type ApplyFn = dyn Fn(&str, String, &PluginContext<'_>) -> Result<String> + Send + Sync;

/// Plugin built from two synchronous closures. See [`plugin_fn`].
pub struct FnPlugin {
    name: String,
    test: Box<TestFn>,
    apply: Box<ApplyFn>,
}

impl fmt::Debug for FnPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPlugin").field("name", &self.name).finish()
    }
}

#[async_trait]
impl Plugin for FnPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn test(&self, id: &str) -> bool {
        (self.test)(id)
    }

    async fn apply(&self, id: &str, text: String, ctx: &PluginContext<'_>) -> Result<String> {
        (self.apply)(id, text, ctx)
    }
}

/// Create a plugin from a predicate and a transform.
///
/// ```
/// use stitch_bundler::{Plugin, plugin_fn};
///
/// let banner = plugin_fn(
///     "banner",
///     |id| id.ends_with(".js"),
///     |_id, text, _ctx| Ok(format!("/* built with stitch */\n{text}")),
/// );
/// assert_eq!(banner.name(), "banner");
/// assert!(banner.test("src/a.js"));
/// ```
pub fn plugin_fn<T, F>(name: impl Into<String>, test: T, apply: F) -> Arc<dyn Plugin>
where
    T: Fn(&str) -> bool + Send + Sync + 'static,
    F: Fn(&str, String, &PluginContext<'_>) -> Result<String> + Send + Sync + 'static,
{
    Arc::new(FnPlugin {
        name: name.into(),
        test: Box::new(test),
        apply: Box::new(apply),
    })
}

/// Run every plugin in `plugins` that claims `id` over `text`, in order.
pub async fn apply_matching(
    plugins: &[Arc<dyn Plugin>],
    id: &str,
    mut text: String,
    ctx: &PluginContext<'_>,
) -> Result<String> {
    for plugin in plugins {
        if plugin.test(id) {
            tracing::trace!(plugin = plugin.name(), module = %id, "applying plugin");
            text = plugin.apply(id, text, ctx).await?;
        }
    }
    Ok(text)
}
