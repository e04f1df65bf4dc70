//! Bundle assembly tests for stitch-bundler.

#![allow(clippy::disallowed_methods)]

mod helpers;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use helpers::{Project, assert_in_order, bundle_of, output_of};
use stitch_bundler::{
    Error, GraphError, ImportEdge, ImportMap, InputMap, LoadResult, Loader, LoaderContext,
    ModuleSystem, RemoteCache, RuntimeResult, SystemShim, bundle, entries, plugin_fn,
};

const A: &str = "import { b } from \"./b.js\";\nconst c = import(\"./c.js\");\nexport const a = \"A\";";
const B: &str = "export * from \"./d.js\";\nexport const b = \"B\";";
const C: &str = "export const c = \"C\";";
const D: &str = "export const d = \"D\";";

fn scenario() -> Project {
    let project = Project::new();
    project.write("a.js", A);
    project.write("b.js", B);
    project.write("c.js", C);
    project.write("d.js", D);
    project
}

#[tokio::test]
async fn test_static_closure_and_dynamic_root() {
    let project = scenario();
    let result = bundle(entries(["a.js"]), project.options()).await.unwrap();

    assert_eq!(result.output_map.len(), 2);

    let shim = SystemShim;
    let expected_a = [
        shim.preamble(),
        A.to_string(),
        B.to_string(),
        D.to_string(),
        shim.instantiate(&output_of(&result, "a.js")),
        "export {};".to_string(),
    ]
    .join("\n");
    assert_eq!(bundle_of(&result, "a.js"), expected_a);

    let expected_c = [
        shim.preamble(),
        C.to_string(),
        shim.instantiate(&output_of(&result, "c.js")),
        "export {};".to_string(),
    ]
    .join("\n");
    assert_eq!(bundle_of(&result, "c.js"), expected_c);

    // Roots are emitted in the order they were assembled.
    let outputs: Vec<&PathBuf> = result.output_map.keys().collect();
    assert_eq!(outputs, vec![&output_of(&result, "a.js"), &output_of(&result, "c.js")]);
    assert_eq!(result.stats.bundled, 2);
    assert_eq!(result.stats.created, 4);
}

#[tokio::test]
async fn test_dynamic_import_is_never_inlined() {
    let project = scenario();
    let result = bundle(entries(["a.js"]), project.options()).await.unwrap();

    assert!(!bundle_of(&result, "a.js").contains(C));
    assert!(bundle_of(&result, "c.js").contains(C));
}

#[tokio::test]
async fn test_cycle_includes_each_module_once() {
    let project = Project::new();
    project.write("a.js", "import \"./b.js\";\nconst A_MARK = 1;");
    project.write("b.js", "import \"./a.js\";\nconst B_MARK = 1;");

    let result = bundle(entries(["a.js"]), project.options()).await.unwrap();

    assert_eq!(result.graph.len(), 2);
    assert_eq!(result.output_map.len(), 1);
    let text = bundle_of(&result, "a.js");
    assert_eq!(text.matches("A_MARK").count(), 1);
    assert_eq!(text.matches("B_MARK").count(), 1);
}

#[tokio::test]
async fn test_dynamic_cycle_terminates() {
    let project = Project::new();
    project.write("a.js", "const b = import(\"./b.js\");");
    project.write("b.js", "const a = import(\"./a.js\");");

    let result = bundle(entries(["a.js"]), project.options()).await.unwrap();
    assert_eq!(result.output_map.len(), 2);
}

#[tokio::test]
async fn test_re_exports_are_transitive() {
    let project = Project::new();
    project.write("main.js", "import { leaf } from \"./barrel.js\";\nconst MAIN = 1;");
    project.write("barrel.js", "export * from \"./mid.js\";\nconst BARREL = 1;");
    project.write("mid.js", "export { leaf } from \"./leaf.js\";\nconst MID = 1;");
    project.write("leaf.js", "export const leaf = \"LEAF\";");

    let result = bundle(entries(["main.js"]), project.options()).await.unwrap();

    assert_in_order(
        bundle_of(&result, "main.js"),
        &["MAIN", "BARREL", "MID", "\"LEAF\""],
    );
    assert_eq!(result.output_map.len(), 1);
}

#[tokio::test]
async fn test_footer_names_root_exports() {
    let project = Project::new();
    project.write("index.js", "export { x as y } from \"./x.js\";\nexport * from \"./z.js\";");
    project.write("x.js", "export const x = 1;");
    project.write("z.js", "export const z = 1;");

    let result = bundle(entries(["index.js"]), project.options()).await.unwrap();

    let text = bundle_of(&result, "index.js");
    assert!(text.ends_with("const { y } = __instance;\nexport { y };"));
    // Exposed names, never the ids of the re-export sources.
    let footer = &text[text.rfind("const { ").unwrap()..];
    assert!(!footer.contains(".js"));
    assert!(text.contains("export const x = 1;"));
    assert!(text.contains("export const z = 1;"));
}

#[tokio::test]
async fn test_missing_import_aborts_build() {
    let project = Project::new();
    project.write("src/a.js", "import { gone } from \"./missing.mod\";");

    let err = bundle(entries(["src/a.js"]), project.options())
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("src/a.js"));
    assert!(message.contains("missing.mod"));
    assert!(matches!(err, Error::Graph(GraphError::ImportNotFound { .. })));
}

#[derive(Debug)]
struct FixedImport(&'static str);

#[async_trait]
impl Loader for FixedImport {
    fn name(&self) -> &str {
        "fixed"
    }

    fn test(&self, _id: &str) -> bool {
        true
    }

    async fn load(
        &self,
        _id: &str,
        _source: &str,
        _ctx: &LoaderContext<'_>,
    ) -> stitch_graph::Result<LoadResult> {
        let mut result = LoadResult::default();
        result.imports.insert(self.0.to_string(), ImportEdge::STATIC);
        Ok(result)
    }
}

#[tokio::test]
async fn test_missing_import_message_names_specifier() {
    let project = Project::new();
    project.write("a.mod", "");

    let options = project
        .options()
        .loaders(vec![Arc::new(FixedImport("./missing.mod"))]);
    let err = bundle(entries(["a.mod"]), options).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "file 'a.mod' import not found: './missing.mod'"
    );
}

#[tokio::test]
async fn test_missing_re_export_aborts_build() {
    let project = Project::new();
    project.write("a.js", "export * from \"./nowhere.js\";");

    let err = bundle(entries(["a.js"]), project.options()).await.unwrap_err();
    assert!(matches!(err, Error::Graph(GraphError::ExportNotFound { .. })));
}

#[tokio::test]
async fn test_unclaimed_module_is_left_out() {
    let project = Project::new();
    project.write("a.js", "import logo from \"./logo.svg\";\nconst A_MARK = 1;");
    project.write("logo.svg", "<svg/>");

    let result = bundle(entries(["a.js"]), project.options()).await.unwrap();

    assert!(!result.graph.contains("logo.svg"));
    let text = bundle_of(&result, "a.js");
    assert!(text.contains("A_MARK"));
    assert!(!text.contains("<svg/>"));
}

#[tokio::test]
async fn test_binary_asset_import_does_not_abort() {
    let project = Project::new();
    project.write("a.js", "import logo from \"./logo.png\";\nconst A_MARK = 1;");
    fs::write(project.path("logo.png"), [0x89, 0x50, 0x4e, 0x47, 0xff, 0xfe]).unwrap();

    let result = bundle(entries(["a.js"]), project.options()).await.unwrap();

    assert!(!result.graph.contains("logo.png"));
    assert_eq!(result.output_map.len(), 1);
    assert!(bundle_of(&result, "a.js").contains("A_MARK"));
}

#[tokio::test]
async fn test_dotted_entry_shares_node_with_imports() {
    let project = Project::new();
    project.write("src/a.js", "import \"./b.js\";\nconst A_MARK = 1;");
    project.write("src/b.js", "import \"./a.js\";\nconst B_MARK = 1;");

    let result = bundle(entries(["./src/a.js"]), project.options()).await.unwrap();

    assert_eq!(result.graph.len(), 2);
    assert!(result.graph.contains("src/a.js"));
    assert!(!result.graph.contains("./src/a.js"));

    let text = bundle_of(&result, "src/a.js");
    assert_eq!(text.matches("A_MARK").count(), 1);
    assert_eq!(text.matches("B_MARK").count(), 1);
}

#[tokio::test]
async fn test_virtual_entry_source() {
    let project = Project::new();
    project.write("dep.js", "export const dep = \"DEP\";");

    let mut input_map = InputMap::default();
    input_map.insert(
        "virtual.js".into(),
        "import { dep } from \"./dep.js\";\nconst VIRTUAL = dep;".into(),
    );

    let result = bundle(input_map, project.options()).await.unwrap();
    assert_in_order(bundle_of(&result, "virtual.js"), &["VIRTUAL", "\"DEP\""]);
}

#[tokio::test]
async fn test_pre_seeded_file_map_pins_output() {
    let project = Project::new();
    project.write("a.js", "const A_MARK = 1;");

    let mut file_map = stitch_bundler::FileMap::default();
    file_map.insert("a.js".into(), PathBuf::from("dist/app.js"));

    let result = bundle(entries(["a.js"]), project.options().file_map(file_map))
        .await
        .unwrap();
    assert!(result.output_map.contains_key(Path::new("dist/app.js")));
    assert_eq!(result.file_map["a.js"], PathBuf::from("dist/app.js"));
}

#[tokio::test]
async fn test_transformers_run_on_cache_miss_only() {
    let project = scenario();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let upper = plugin_fn(
        "upper",
        |id| id.ends_with(".js"),
        move |id, text, ctx| {
            counter.fetch_add(1, Ordering::SeqCst);
            assert!(ctx.graph.contains(id));
            assert_eq!(ctx.out_dir, Path::new("dist"));
            Ok(text.to_uppercase())
        },
    );

    let first = bundle(entries(["a.js"]), project.options().transformer(upper.clone()))
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert!(bundle_of(&first, "a.js").contains("EXPORT CONST D = \"D\";"));
    project.persist(&first).await;

    let second = bundle(entries(["a.js"]), project.resume(&first).transformer(upper))
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(second.stats.checked, 4);
}

#[tokio::test]
async fn test_optimizers_require_optimize_flag() {
    let project = scenario();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let flatten = plugin_fn(
        "flatten",
        |id| id == "a.js",
        move |_, text, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(text.replace('\n', " "))
        },
    );

    let plain = bundle(entries(["a.js"]), project.options().optimizer(flatten.clone()))
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(bundle_of(&plain, "a.js").contains('\n'));

    let optimized = bundle(
        entries(["a.js"]),
        project.options().optimizer(flatten).optimize(true),
    )
    .await
    .unwrap();

    // Matched against the root id only: `c.js` is emitted but not optimized.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!bundle_of(&optimized, "a.js").contains('\n'));
    assert!(bundle_of(&optimized, "c.js").contains('\n'));
}

#[tokio::test]
async fn test_optimizers_skip_up_to_date_bundles() {
    let project = scenario();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let count = plugin_fn("count", |_| true, move |_, text, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(text)
    });

    let first = bundle(
        entries(["a.js"]),
        project.options().optimizer(count.clone()).optimize(true),
    )
    .await
    .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    project.persist(&first).await;

    let second = bundle(
        entries(["a.js"]),
        project.resume(&first).optimizer(count).optimize(true),
    )
    .await
    .unwrap();
    assert!(second.output_map.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[derive(Debug)]
struct DirRemote {
    dir: PathBuf,
    fetches: AtomicUsize,
}

#[async_trait]
impl RemoteCache for DirRemote {
    async fn cache(&self, url: &str, _import_map: &ImportMap) -> RuntimeResult<()> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        fs::create_dir_all(&self.dir).unwrap();
        fs::write(self.resolve(url), format!("export const remote = {url:?};")).unwrap();
        Ok(())
    }

    fn resolve(&self, url: &str) -> PathBuf {
        self.dir.join(stitch_bundler::hash_id(url))
    }
}

#[tokio::test]
async fn test_remote_modules_go_through_remote_cache() {
    let project = Project::new();
    project.write(
        "a.js",
        "import { remote } from \"https://cdn.example/lib.js\";",
    );
    let remote = Arc::new(DirRemote {
        dir: project.path("remote"),
        fetches: AtomicUsize::new(0),
    });

    let result = bundle(entries(["a.js"]), project.options().remote(remote.clone()))
        .await
        .unwrap();

    assert_eq!(remote.fetches.load(Ordering::SeqCst), 1);
    assert!(bundle_of(&result, "a.js").contains("export const remote = \"https://cdn.example/lib.js\";"));
    let entry = result.graph.get("https://cdn.example/lib.js").unwrap();
    assert_eq!(entry.path, remote.resolve("https://cdn.example/lib.js"));
}
