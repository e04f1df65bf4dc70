//! Regex-based ECMAScript module loader.
//!
//! Scans source text for `import` statements, `import()` calls with a string
//! literal, and `export ... from` re-exports. This is a lexical scan; it does
//! not parse the module, so imports inside string literals are picked up too.

use std::path::Path;
use std::sync::LazyLock;

use async_trait::async_trait;
use path_clean::PathClean;
use regex::Regex;

use super::{LoadResult, Loader, LoaderContext};
use crate::Result;
use crate::graph::ImportEdge;
use crate::import_map::ImportMap;
use crate::module_id::is_remote;

const EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "jsx", "ts", "tsx"];

/// `//` to end of line, unless it follows a `:` as in `https://`.
static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(^|[^:])//.*$").expect("line comment regex is valid"));

static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("block comment regex is valid"));

static STATIC_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)(?:^|[;\s])import\s+(?:[\w$*{}\s,]+?\s+from\s+)?["']([^"'\n]+)["']"#)
        .expect("static import regex is valid")
});

static DYNAMIC_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bimport\s*\(\s*["']([^"'\n]+)["']\s*\)"#).expect("dynamic import regex is valid")
});

static RE_EXPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)(?:^|[;\s])export\s+(?:type\s+)?(?:\*(?:\s+as\s+([\w$]+))?|\{([^}]*)\})\s*from\s*["']([^"'\n]+)["']"#,
    )
    .expect("re-export regex is valid")
});

/// Loader for `.js`, `.mjs`, `.cjs`, `.jsx`, `.ts` and `.tsx` modules.
#[derive(Debug, Clone, Default)]
pub struct EsmLoader;

impl EsmLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Loader for EsmLoader {
    fn name(&self) -> &str {
        "esm"
    }

    fn test(&self, id: &str) -> bool {
        let path = id.split(['?', '#']).next().unwrap_or(id);
        Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| EXTENSIONS.contains(&ext))
    }

    async fn load(&self, id: &str, source: &str, ctx: &LoaderContext<'_>) -> Result<LoadResult> {
        Ok(scan(id, source, ctx.import_map))
    }
}

fn scan(id: &str, source: &str, import_map: &ImportMap) -> LoadResult {
    let without_blocks = BLOCK_COMMENT.replace_all(source, "");
    let code = LINE_COMMENT.replace_all(&without_blocks, "${1}");

    let mut found: Vec<(usize, String, ImportEdge)> = Vec::new();
    for caps in STATIC_IMPORT.captures_iter(&code) {
        if let Some(m) = caps.get(1) {
            found.push((m.start(), m.as_str().to_string(), ImportEdge::STATIC));
        }
    }
    for caps in DYNAMIC_IMPORT.captures_iter(&code) {
        if let Some(m) = caps.get(1) {
            found.push((m.start(), m.as_str().to_string(), ImportEdge::DYNAMIC));
        }
    }
    found.sort_by_key(|(start, _, _)| *start);

    let mut result = LoadResult::default();
    for (_, specifier, edge) in found {
        let target = resolve_specifier(&specifier, id, import_map);
        let slot = result.imports.entry(target).or_insert(edge);
        // A static import anywhere keeps the module inlined.
        if !edge.dynamic {
            slot.dynamic = false;
        }
    }

    for caps in RE_EXPORT.captures_iter(&code) {
        let Some(from) = caps.get(3) else { continue };
        let names: Vec<String> = match (caps.get(1), caps.get(2)) {
            (Some(namespace), _) => vec![namespace.as_str().to_string()],
            (None, Some(list)) => parse_export_list(list.as_str()),
            (None, None) => vec!["*".to_string()],
        };
        let target = resolve_specifier(from.as_str(), id, import_map);
        result.exports.entry(target).or_default().extend(names);
    }

    result
}

/// Exposed names of `a, b as c, type d` → `["a", "c", "d"]`.
fn parse_export_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .filter_map(|item| item.split_whitespace().last())
        .map(str::to_string)
        .collect()
}

/// Resolve `specifier` as written inside `importer`.
///
/// Import-map entries win. Relative specifiers are joined onto the
/// importer's directory and lexically cleaned; everything else is kept
/// verbatim.
fn resolve_specifier(specifier: &str, importer: &str, import_map: &ImportMap) -> String {
    if let Some(mapped) = import_map.resolve(specifier, importer) {
        return mapped;
    }

    if !(specifier.starts_with("./") || specifier.starts_with("../")) {
        return specifier.to_string();
    }

    if is_remote(importer) {
        return join_remote(importer, specifier);
    }

    let dir = Path::new(importer).parent().unwrap_or(Path::new(""));
    dir.join(specifier).clean().to_string_lossy().into_owned()
}

fn join_remote(importer: &str, specifier: &str) -> String {
    let Some((scheme, rest)) = importer.split_once("://") else {
        return specifier.to_string();
    };
    let (host, path) = rest.split_once('/').unwrap_or((rest, ""));

    let base = Path::new("/").join(path);
    let dir = base.parent().unwrap_or(Path::new("/"));
    let joined = dir.join(specifier).clean();

    format!("{}://{}{}", scheme, host, joined.to_string_lossy())
}
