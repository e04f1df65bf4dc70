//! Runtime module-system shim.
//!
//! Each bundle starts with a preamble that sets up a module registry and ends
//! with a footer that instantiates the bundle and re-exposes its exports.
//! The exact text is owned by a [`ModuleSystem`]; [`SystemShim`] is the
//! default.

use std::fmt;
use std::path::Path;

/// Produces the runtime shim code around bundled module sources.
pub trait ModuleSystem: Send + Sync + fmt::Debug {
    /// Code emitted before the first module of every bundle.
    fn preamble(&self) -> String;

    /// Statement that instantiates the bundle emitted at `output`.
    fn instantiate(&self, output: &Path) -> String;

    /// Statement re-exposing `names` from the instantiated bundle.
    ///
    /// `names` are the identifiers the root re-exports, flattened across its
    /// re-export sources ([`GraphEntry::exported_names`]), not the ids of
    /// those sources. A star re-export contributes `*`.
    ///
    /// [`GraphEntry::exported_names`]: stitch_graph::GraphEntry::exported_names
    fn exports(&self, names: &[String]) -> String;
}

const PREAMBLE: &str = r#"var System = globalThis.System || (globalThis.System = (function () {
  var registry = Object.create(null);
  return {
    register: function (id, factory) {
      registry[id] = { factory: factory, exports: null };
    },
    import: function (id) {
      var record = registry[id];
      if (!record) return Promise.reject(new Error("module not registered: " + id));
      if (!record.exports) {
        record.exports = {};
        record.factory(record.exports);
      }
      return Promise.resolve(record.exports);
    },
  };
})());"#;

/// Minimal registry-based module system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemShim;

impl ModuleSystem for SystemShim {
    fn preamble(&self) -> String {
        PREAMBLE.to_string()
    }

    fn instantiate(&self, output: &Path) -> String {
        let id = output.to_string_lossy();
        // JSON string escaping is valid JavaScript string escaping.
        let literal = serde_json::to_string(id.as_ref()).unwrap_or_else(|_| format!("\"{id}\""));
        format!("const __instance = await System.import({literal});")
    }

    fn exports(&self, names: &[String]) -> String {
        // `*` marks a star re-export, which has no name to bind.
        let names: Vec<&str> = names
            .iter()
            .map(String::as_str)
            .filter(|name| *name != "*")
            .collect();

        if names.is_empty() {
            return "export {};".to_string();
        }

        let list = names.join(", ");
        format!("const {{ {list} }} = __instance;\nexport {{ {list} }};")
    }
}
