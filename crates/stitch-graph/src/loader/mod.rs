//! Loader dispatch.
//!
//! A loader turns the raw source of one module into its declared edges.
//! Loaders form an ordered list and the first one whose [`Loader::test`]
//! claims a module id is the only one invoked for it.

mod esm;

pub use esm::EsmLoader;

use std::sync::Arc;

use async_trait::async_trait;

use crate::graph::{Exports, Imports};
use crate::import_map::ImportMap;
use crate::Result;

/// Context handed to every loader invocation.
#[derive(Debug, Clone, Copy)]
pub struct LoaderContext<'a> {
    pub import_map: &'a ImportMap,
}

/// Edges declared by a module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadResult {
    pub imports: Imports,
    pub exports: Exports,
}

/// Extracts import and re-export edges from a module's source.
#[async_trait]
pub trait Loader: Send + Sync + std::fmt::Debug {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Whether this loader handles `id`.
    fn test(&self, id: &str) -> bool;

    /// Declare the edges of `id` given its `source`.
    async fn load(&self, id: &str, source: &str, ctx: &LoaderContext<'_>) -> Result<LoadResult>;
}

/// First loader in `loaders` that claims `id`.
pub fn select<'a>(loaders: &'a [Arc<dyn Loader>], id: &str) -> Option<&'a Arc<dyn Loader>> {
    loaders.iter().find(|loader| loader.test(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ImportEdge;

    #[derive(Debug)]
    struct Suffix(&'static str, &'static str);

    #[async_trait]
    impl Loader for Suffix {
        fn name(&self) -> &str {
            self.1
        }

        fn test(&self, id: &str) -> bool {
            id.ends_with(self.0)
        }

        async fn load(&self, _id: &str, _source: &str, _ctx: &LoaderContext<'_>) -> Result<LoadResult> {
            let mut result = LoadResult::default();
            result.imports.insert(self.1.to_string(), ImportEdge::STATIC);
            Ok(result)
        }
    }

    #[test]
    fn test_first_match_wins() {
        let loaders: Vec<Arc<dyn Loader>> = vec![
            Arc::new(Suffix(".ts", "typescript")),
            Arc::new(Suffix(".js", "first-js")),
            Arc::new(Suffix(".js", "second-js")),
        ];

        assert_eq!(select(&loaders, "a.js").map(|l| l.name()), Some("first-js"));
        assert_eq!(select(&loaders, "a.ts").map(|l| l.name()), Some("typescript"));
        assert!(select(&loaders, "a.css").is_none());
    }
}
