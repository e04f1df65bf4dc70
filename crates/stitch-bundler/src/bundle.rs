//! Bundle assembly.
//!
//! [`bundle`] resolves the module graph for the entries in its input map,
//! then assembles one bundle per root. Roots start as the entries; every
//! dynamic import found while walking a root's closure becomes a root of its
//! own. Both worklists are LIFO, and bundle text is the literal concatenation
//! of module texts in pop order.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use tracing::{debug, info};

use crate::cache::{CacheMap, CacheStatus, cache_path, cache_status, read_cached};
use crate::config::StitchConfig;
use crate::logging::LogLevel;
use crate::plugins::{Plugin, PluginContext, apply_matching};
use crate::system::{ModuleSystem, SystemShim};
use crate::{Error, Result};
use stitch_graph::{
    EsmLoader, FileMap, Graph, GraphBuilder, GraphState, ImportMap, InputMap, Loader,
    RemoteCache, Runtime, SourceResolver, normalize_id, output_path,
};

/// Final bundle text keyed by output path.
pub type OutputMap = IndexMap<PathBuf, String>;

/// Input map listing `ids` as entries whose sources are read from disk.
pub fn entries<I, S>(ids: I) -> InputMap
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ids.into_iter().map(|id| (id.into(), String::new())).collect()
}

/// Options for a [`bundle`] call.
#[derive(Debug, Clone)]
pub struct BundleOptions {
    pub out_dir: PathBuf,
    /// Bundle directory, relative to `out_dir`.
    pub deps_dir: PathBuf,
    /// Transform cache directory, relative to `out_dir`.
    pub cache_dir: PathBuf,
    /// Graph from a previous run. Entries are trusted unless `reload` is set.
    pub graph: Graph,
    /// Output paths from a previous run.
    pub file_map: FileMap,
    pub import_map: ImportMap,
    pub loaders: Vec<Arc<dyn Loader>>,
    pub transformers: Vec<Arc<dyn Plugin>>,
    pub optimizers: Vec<Arc<dyn Plugin>>,
    pub system: Arc<dyn ModuleSystem>,
    pub runtime: Arc<dyn Runtime>,
    pub remote: Option<Arc<dyn RemoteCache>>,
    /// Ignore the previous graph and every cache file.
    pub reload: bool,
    /// Run optimizers over emitted bundles.
    pub optimize: bool,
    /// Suppress progress logging.
    pub quiet: bool,
}

impl BundleOptions {
    /// Default options doing all I/O through `runtime`.
    ///
    /// The only loader is [`EsmLoader`]; there are no transformers or
    /// optimizers.
    pub fn new(runtime: Arc<dyn Runtime>) -> Self {
        Self {
            out_dir: PathBuf::from("dist"),
            deps_dir: PathBuf::from("deps"),
            cache_dir: PathBuf::from(".cache"),
            graph: Graph::default(),
            file_map: FileMap::default(),
            import_map: ImportMap::default(),
            loaders: vec![Arc::new(EsmLoader::new())],
            transformers: Vec::new(),
            optimizers: Vec::new(),
            system: Arc::new(SystemShim),
            runtime,
            remote: None,
            reload: false,
            optimize: false,
            quiet: false,
        }
    }

    /// Options from a loaded [`StitchConfig`].
    ///
    /// Reads the configured import map file through `runtime`. Progress
    /// logging is off unless the effective log level includes `info`.
    pub async fn from_config(config: &StitchConfig, runtime: Arc<dyn Runtime>) -> Result<Self> {
        let import_map = match &config.import_map {
            Some(path) => {
                let bytes = runtime.read_file(path).await?;
                let json = String::from_utf8(bytes).map_err(|_| {
                    Error::InvalidConfig(format!(
                        "import map {} is not valid UTF-8",
                        path.display()
                    ))
                })?;
                ImportMap::from_json(&json).map_err(|e| {
                    Error::InvalidConfig(format!("import map {}: {}", path.display(), e))
                })?
            }
            None => ImportMap::default(),
        };

        Ok(Self::new(runtime)
            .out_dir(&config.out_dir)
            .deps_dir(&config.deps_dir)
            .cache_dir(&config.cache_dir)
            .import_map(import_map)
            .reload(config.reload)
            .optimize(config.optimize)
            .quiet(config.effective_log_level() < LogLevel::Info))
    }

    pub fn out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = dir.into();
        self
    }

    pub fn deps_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.deps_dir = dir.into();
        self
    }

    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Resume from a previous run's graph.
    pub fn graph(mut self, graph: Graph) -> Self {
        self.graph = graph;
        self
    }

    /// Resume from a previous run's output paths.
    pub fn file_map(mut self, file_map: FileMap) -> Self {
        self.file_map = file_map;
        self
    }

    pub fn import_map(mut self, import_map: ImportMap) -> Self {
        self.import_map = import_map;
        self
    }

    /// Replace the loader list.
    pub fn loaders(mut self, loaders: Vec<Arc<dyn Loader>>) -> Self {
        self.loaders = loaders;
        self
    }

    /// Append a transformer.
    pub fn transformer(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.transformers.push(plugin);
        self
    }

    /// Append an optimizer.
    pub fn optimizer(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.optimizers.push(plugin);
        self
    }

    pub fn system(mut self, system: Arc<dyn ModuleSystem>) -> Self {
        self.system = system;
        self
    }

    pub fn remote(mut self, remote: Arc<dyn RemoteCache>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn reload(mut self, reload: bool) -> Self {
        self.reload = reload;
        self
    }

    pub fn optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }
}

/// Counters for one [`bundle`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BundleStats {
    /// Modules served from a fresh cache file.
    pub checked: usize,
    /// Modules transformed for the first time.
    pub created: usize,
    /// Modules whose cache file was stale.
    pub updated: usize,
    /// Bundles emitted into the output map.
    pub bundled: usize,
    /// Bundles skipped because nothing changed.
    pub up_to_date: usize,
}

impl BundleStats {
    /// Modules that went through the transform pipeline.
    pub fn regenerated(&self) -> usize {
        self.created + self.updated
    }
}

/// Everything a build produced.
///
/// Nothing has been written yet; see [`crate::write_outputs`].
#[derive(Debug, Clone, Default)]
pub struct BundleResult {
    pub output_map: OutputMap,
    pub cache_map: CacheMap,
    pub graph: Graph,
    /// Output paths to pass to the next run.
    pub file_map: FileMap,
    pub stats: BundleStats,
}

/// Mutable state of one build.
struct BuildContext {
    graph: Graph,
    file_map: FileMap,
    input_map: InputMap,
    cache_map: CacheMap,
    output_map: OutputMap,
    stats: BundleStats,
}

impl BuildContext {
    fn new(state: GraphState) -> Self {
        Self {
            graph: state.graph,
            file_map: state.file_map,
            input_map: state.input_map,
            cache_map: CacheMap::default(),
            output_map: OutputMap::default(),
            stats: BundleStats::default(),
        }
    }

    fn into_result(self) -> BundleResult {
        BundleResult {
            output_map: self.output_map,
            cache_map: self.cache_map,
            graph: self.graph,
            file_map: self.file_map,
            stats: self.stats,
        }
    }
}

/// Bundle every entry of `input_map`.
///
/// The keys of `input_map` are the entries, normalized with
/// [`normalize_id`]. Non-empty values override the source on disk; empty
/// values are read through the runtime.
///
/// Fails without producing any output if an import or re-export target does
/// not exist, or if a source read, loader or plugin fails.
pub async fn bundle(input_map: InputMap, mut options: BundleOptions) -> Result<BundleResult> {
    let entries: Vec<String> = input_map.keys().map(|id| normalize_id(id)).collect();
    let deps_path = options.out_dir.join(&options.deps_dir);
    let cache_dir = options.out_dir.join(&options.cache_dir);

    let mut resolver = SourceResolver::new(options.runtime.clone());
    if let Some(remote) = &options.remote {
        resolver = resolver.with_remote(remote.clone());
    }

    let mut state = GraphState::new(
        std::mem::take(&mut options.graph),
        std::mem::take(&mut options.file_map),
        input_map,
    );
    GraphBuilder::new(&resolver, &options.loaders, &options.import_map, &deps_path)
        .reload(options.reload)
        .build(&entries, &mut state)
        .await?;
    debug!(modules = state.graph.len(), "module graph resolved");

    let assembler = Assembler {
        options: &options,
        resolver: &resolver,
        deps_path,
        cache_dir,
    };
    let mut cx = BuildContext::new(state);
    assembler.run(entries, &mut cx).await?;

    Ok(cx.into_result())
}

struct Assembler<'a> {
    options: &'a BundleOptions,
    resolver: &'a SourceResolver,
    deps_path: PathBuf,
    cache_dir: PathBuf,
}

impl Assembler<'_> {
    async fn run(&self, mut roots: Vec<String>, cx: &mut BuildContext) -> Result<()> {
        let mut checked: FxHashSet<String> = FxHashSet::default();

        while let Some(root) = roots.pop() {
            if !checked.insert(root.clone()) {
                continue;
            }
            if !cx.graph.contains(&root) {
                debug!(module = %root, "bundle root has no graph entry, skipping");
                continue;
            }
            self.assemble(&root, cx, &mut roots).await?;
        }

        Ok(())
    }

    /// Assemble the bundle for `root`, pushing dynamic imports onto `roots`.
    async fn assemble(&self, root: &str, cx: &mut BuildContext, roots: &mut Vec<String>) -> Result<()> {
        let system = &self.options.system;
        let mut parts = vec![system.preamble()];
        let mut needs_update = false;

        let mut dependencies = vec![root.to_string()];
        let mut checked: FxHashSet<String> = FxHashSet::default();

        while let Some(dependency) = dependencies.pop() {
            if !checked.insert(dependency.clone()) {
                continue;
            }
            let Some(entry) = cx.graph.get(&dependency) else {
                debug!(module = %dependency, "dependency has no graph entry, skipping");
                continue;
            };

            for (target, edge) in &entry.imports {
                if edge.dynamic {
                    roots.push(target.clone());
                } else {
                    dependencies.push(target.clone());
                }
            }
            dependencies.extend(entry.exports.keys().cloned());
            let source_path = entry.path.clone();

            let (text, regenerated) = self
                .dependency_text(&dependency, &source_path, dependency == root, cx)
                .await?;
            needs_update |= regenerated;
            parts.push(text);
        }

        let output = output_path(root, &mut cx.file_map, &self.deps_path);
        if !self.options.runtime.exists(&output) {
            needs_update = true;
        }

        if !needs_update {
            self.progress("up-to-date", root);
            cx.stats.up_to_date += 1;
            return Ok(());
        }

        let names = cx
            .graph
            .get(root)
            .map(|entry| entry.exported_names())
            .unwrap_or_default();
        parts.push(system.instantiate(&output));
        parts.push(system.exports(&names));
        let mut text = parts.join("\n");

        if self.options.optimize {
            let ctx = self.plugin_context(cx);
            text = apply_matching(&self.options.optimizers, root, text, &ctx).await?;
        }

        self.progress("Bundle", root);
        cx.stats.bundled += 1;
        cx.output_map.insert(output, text);
        Ok(())
    }

    /// Text `id` contributes to a bundle, and whether it was regenerated.
    async fn dependency_text(
        &self,
        id: &str,
        source_path: &Path,
        is_root: bool,
        cx: &mut BuildContext,
    ) -> Result<(String, bool)> {
        let runtime = self.options.runtime.as_ref();
        let cache = cache_path(id, &self.cache_dir);
        let status = cache_status(runtime, source_path, &cache, self.options.reload).await?;

        if !is_root {
            self.progress(status.label(), id);
        }

        if status.is_fresh() {
            cx.stats.checked += 1;
            let text = read_cached(runtime, &cache, &mut cx.cache_map).await?;
            return Ok((text, false));
        }

        let source = self
            .resolver
            .source(id, &mut cx.input_map, &self.options.import_map)
            .await?;
        let ctx = self.plugin_context(cx);
        let text = apply_matching(&self.options.transformers, id, source, &ctx).await?;

        match status {
            CacheStatus::Missing => cx.stats.created += 1,
            _ => cx.stats.updated += 1,
        }
        cx.cache_map.insert(cache, text.clone());
        Ok((text, true))
    }

    fn plugin_context<'c>(&'c self, cx: &'c BuildContext) -> PluginContext<'c> {
        PluginContext {
            graph: &cx.graph,
            file_map: &cx.file_map,
            import_map: &self.options.import_map,
            out_dir: &self.options.out_dir,
            deps_dir: &self.options.deps_dir,
        }
    }

    fn progress(&self, label: &str, module: &str) {
        if !self.options.quiet {
            info!(module = %module, "{}", label);
        }
    }
}
