use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Specifier remapping in the JSON shape of a browser import map.
///
/// ```
/// use stitch_graph::ImportMap;
///
/// let map = ImportMap::from_json(r#"{
///     "imports": { "lodash/": "https://cdn.example/lodash/" },
///     "scopes": { "vendor/": { "lodash/": "vendor/lodash/" } }
/// }"#).unwrap();
///
/// assert_eq!(
///     map.resolve("lodash/get.js", "src/index.js").as_deref(),
///     Some("https://cdn.example/lodash/get.js"),
/// );
/// assert_eq!(
///     map.resolve("lodash/get.js", "vendor/a.js").as_deref(),
///     Some("vendor/lodash/get.js"),
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportMap {
    #[serde(default)]
    pub imports: IndexMap<String, String>,
    #[serde(default)]
    pub scopes: IndexMap<String, IndexMap<String, String>>,
}

impl ImportMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn insert(&mut self, specifier: impl Into<String>, target: impl Into<String>) {
        self.imports.insert(specifier.into(), target.into());
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.scopes.is_empty()
    }

    /// Remap `specifier` as seen from `referrer`.
    ///
    /// Scopes whose key prefixes the referrer are tried longest first, then
    /// the top-level imports. Returns `None` when nothing matches.
    pub fn resolve(&self, specifier: &str, referrer: &str) -> Option<String> {
        let mut scopes: Vec<(&String, &IndexMap<String, String>)> = self
            .scopes
            .iter()
            .filter(|(prefix, _)| referrer.starts_with(prefix.as_str()))
            .collect();
        scopes.sort_by_key(|(prefix, _)| std::cmp::Reverse(prefix.len()));

        scopes
            .into_iter()
            .find_map(|(_, imports)| resolve_in(imports, specifier))
            .or_else(|| resolve_in(&self.imports, specifier))
    }
}

fn resolve_in(imports: &IndexMap<String, String>, specifier: &str) -> Option<String> {
    if let Some(target) = imports.get(specifier) {
        return Some(target.clone());
    }

    imports
        .iter()
        .filter(|(key, _)| key.ends_with('/') && specifier.starts_with(key.as_str()))
        .max_by_key(|(key, _)| key.len())
        .map(|(key, target)| format!("{}{}", target, &specifier[key.len()..]))
}
