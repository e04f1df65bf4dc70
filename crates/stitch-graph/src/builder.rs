//! Graph builder.
//!
//! Discovers the transitive module graph from a set of entries with an
//! explicit LIFO worklist. Import and re-export edges are both traversal
//! edges; a shared checked-set makes every identifier resolve at most once
//! per build, which is what lets cyclic graphs terminate.

use std::path::PathBuf;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::graph::{FileMap, Graph, GraphEntry, InputMap};
use crate::import_map::ImportMap;
use crate::loader::{self, LoadResult, Loader, LoaderContext};
use crate::module_id::{normalize_id, output_path};
use crate::source::SourceResolver;
use crate::{GraphError, Result};

/// Mutable state threaded through a build.
///
/// Pre-seed any of the maps to resume from a previous run: existing graph
/// entries are trusted unless the builder reloads, file map entries pin
/// output paths, and input map entries override sources on disk.
#[derive(Debug, Clone, Default)]
pub struct GraphState {
    pub graph: Graph,
    pub file_map: FileMap,
    pub input_map: InputMap,
}

impl GraphState {
    pub fn new(graph: Graph, file_map: FileMap, input_map: InputMap) -> Self {
        Self {
            graph,
            file_map,
            input_map,
        }
    }
}

/// Resolves entry modules into a [`Graph`].
#[derive(Debug)]
pub struct GraphBuilder<'a> {
    resolver: &'a SourceResolver,
    loaders: &'a [Arc<dyn Loader>],
    import_map: &'a ImportMap,
    base: PathBuf,
    reload: bool,
}

impl<'a> GraphBuilder<'a> {
    /// `base` is the directory output paths are assigned under.
    pub fn new(
        resolver: &'a SourceResolver,
        loaders: &'a [Arc<dyn Loader>],
        import_map: &'a ImportMap,
        base: impl Into<PathBuf>,
    ) -> Self {
        Self {
            resolver,
            loaders,
            import_map,
            base: base.into(),
            reload: false,
        }
    }

    /// Re-resolve modules even when the graph already has an entry for them.
    pub fn reload(mut self, reload: bool) -> Self {
        self.reload = reload;
        self
    }

    /// Resolve `entries` and everything reachable from them into `state.graph`.
    ///
    /// Entry ids and `state.input_map` keys are normalized with
    /// [`normalize_id`] first. Fails on the first import or re-export target
    /// that is neither remote nor present on disk. Modules no loader claims
    /// get no graph entry and are not traversed further.
    pub async fn build(&self, entries: &[String], state: &mut GraphState) -> Result<()> {
        let mut worklist: Vec<String> = entries.iter().map(|id| normalize_id(id)).collect();
        state.input_map = std::mem::take(&mut state.input_map)
            .into_iter()
            .map(|(id, source)| (normalize_id(&id), source))
            .collect();
        let mut checked: FxHashSet<String> = FxHashSet::default();
        let ctx = LoaderContext {
            import_map: self.import_map,
        };

        while let Some(id) = worklist.pop() {
            if !checked.insert(id.clone()) {
                continue;
            }

            if !self.reload {
                if let Some(entry) = state.graph.get(&id) {
                    trace!(module = %id, "reusing graph entry");
                    worklist.extend(entry.imports.keys().cloned());
                    worklist.extend(entry.exports.keys().cloned());
                    continue;
                }
            }

            // Unclaimed modules are never read.
            let Some(loader) = loader::select(self.loaders, &id) else {
                debug!(module = %id, "no loader claimed module, skipping");
                continue;
            };
            debug!(module = %id, loader = loader.name(), "loading module");

            let source = self
                .resolver
                .source(&id, &mut state.input_map, self.import_map)
                .await?;

            let LoadResult { imports, exports } = loader.load(&id, &source, &ctx).await?;
            let path = self.resolver.resolve_path(&id)?;
            let output = output_path(&id, &mut state.file_map, &self.base);

            for dependency in imports.keys() {
                if !self.resolver.is_available(dependency)? {
                    return Err(GraphError::ImportNotFound {
                        input: id,
                        dependency: dependency.clone(),
                    });
                }
                worklist.push(dependency.clone());
            }

            for dependency in exports.keys() {
                if !self.resolver.is_available(dependency)? {
                    return Err(GraphError::ExportNotFound {
                        input: id,
                        dependency: dependency.clone(),
                    });
                }
                worklist.push(dependency.clone());
            }

            state.graph.insert(
                id,
                GraphEntry {
                    path,
                    output,
                    imports,
                    exports,
                },
            );
        }

        Ok(())
    }
}
