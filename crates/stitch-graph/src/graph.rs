//! Graph data model.
//!
//! All maps are insertion ordered: bundle text is a literal concatenation in
//! traversal order, and traversal order follows the order loaders reported
//! their edges in.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How a module reaches one of its imports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEdge {
    /// Resolved at runtime; the target becomes its own bundle root.
    pub dynamic: bool,
}

impl ImportEdge {
    /// A static import, inlined into the importer's bundle.
    pub const STATIC: Self = Self { dynamic: false };

    /// A dynamic import, emitted as a separate bundle.
    pub const DYNAMIC: Self = Self { dynamic: true };
}

/// Import edges keyed by target module id.
pub type Imports = IndexMap<String, ImportEdge>;

/// Re-export edges keyed by source module id, with the names re-exposed.
pub type Exports = IndexMap<String, Vec<String>>;

/// Raw module sources keyed by module id.
///
/// Seeded by the caller (entries and virtual overrides) and filled in as a
/// read-through cache while building.
pub type InputMap = IndexMap<String, String>;

/// Output path per module id.
pub type FileMap = IndexMap<String, PathBuf>;

/// One resolved module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEntry {
    /// Filesystem path the source is read from (the local cache file for remote modules).
    pub path: PathBuf,
    /// Where this module's bundle is emitted when it is a root.
    pub output: PathBuf,
    #[serde(default)]
    pub imports: Imports,
    #[serde(default)]
    pub exports: Exports,
}

impl GraphEntry {
    /// Static import targets, in declaration order.
    pub fn static_imports(&self) -> impl Iterator<Item = &str> {
        self.imports
            .iter()
            .filter(|(_, edge)| !edge.dynamic)
            .map(|(id, _)| id.as_str())
    }

    /// Dynamic import targets, in declaration order.
    pub fn dynamic_imports(&self) -> impl Iterator<Item = &str> {
        self.imports
            .iter()
            .filter(|(_, edge)| edge.dynamic)
            .map(|(id, _)| id.as_str())
    }

    /// Names this module exposes through re-exports, first occurrence wins.
    pub fn exported_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for name in self.exports.values().flatten() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }
}

/// Module graph keyed by module id. May contain cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Graph {
    entries: IndexMap<String, GraphEntry>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&GraphEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Record a resolved module, replacing any previous entry for `id`.
    pub fn insert(&mut self, id: impl Into<String>, entry: GraphEntry) {
        self.entries.insert(id.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GraphEntry)> {
        self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    /// Serialize the graph so a later run can resume from it.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
