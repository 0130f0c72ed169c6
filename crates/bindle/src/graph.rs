//! Module graph types and the dependency-graph walk.
//!
//! The walk starts at the entry module and discovers every transitively
//! referenced file. Each discovered module is read, pre-processed by the
//! loader pipeline, and rewritten before its dependencies are queued. A module
//! is inserted into the graph before its dependencies are visited, so a
//! dependency cycle finds the module already present and terminates.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::transform::LoaderPipeline;
use crate::{Result, reader, resolver, rewrite};

/// Canonical root-relative identifier for one module.
///
/// Keys are always `/`-separated, start with `./`, and name an existing file
/// (extension and `index` inference has already been applied). Two specifiers
/// that point at the same file normalize to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleKey(String);

impl ModuleKey {
    pub(crate) fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory portion of the key, itself root-relative.
    ///
    /// Used as the referencing directory when resolving this module's own
    /// specifiers: `./src/a.js` refers out of `./src`.
    pub fn dir(&self) -> &str {
        self.0.rsplit_once('/').map_or(".", |(dir, _)| dir)
    }

    /// Absolute path of the file this key names, under `root`.
    pub fn to_path(&self, root: &Path) -> PathBuf {
        let rel = self.0.strip_prefix("./").unwrap_or(&self.0);
        root.join(rel)
    }
}

impl std::fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ModuleKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One fully processed module: rewritten code, dependency keys, and the
/// fingerprint of the raw bytes read from disk.
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    pub key: ModuleKey,
    pub code: String,
    pub dependencies: Vec<ModuleKey>,
    pub content_hash: String,
}

/// Mapping of [`ModuleKey`] to [`ModuleRecord`] for one build.
///
/// The key set doubles as the visited set of the walk. On a successful build
/// the graph is closed: every key in any record's `dependencies` is present
/// as a map key.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    modules: IndexMap<ModuleKey, ModuleRecord>,
}

impl ModuleGraph {
    pub fn contains(&self, key: &ModuleKey) -> bool {
        self.modules.contains_key(key)
    }

    pub fn get(&self, key: &ModuleKey) -> Option<&ModuleRecord> {
        self.modules.get(key)
    }

    pub fn insert(&mut self, record: ModuleRecord) {
        self.modules.insert(record.key.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ModuleKey> {
        self.modules.keys()
    }

    pub fn records(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.modules.values()
    }

    /// True when no record's dependency list mentions a key absent from the
    /// map (no dangling edges).
    pub fn is_closed(&self) -> bool {
        self.modules
            .values()
            .all(|record| record.dependencies.iter().all(|dep| self.contains(dep)))
    }
}

/// Walks the dependency graph from an entry path, producing the flat module
/// map consumed by the emitter.
pub struct GraphBuilder<'a> {
    root: &'a Path,
    pipeline: LoaderPipeline<'a>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(root: &'a Path, pipeline: LoaderPipeline<'a>) -> Self {
        Self { root, pipeline }
    }

    /// Build the full graph reachable from `entry`.
    ///
    /// The walk uses an explicit work list rather than recursion, so graph
    /// depth is bounded by available memory, not stack size. A module is
    /// inserted before its dependencies are queued; a key popped twice is
    /// skipped, which is what terminates cycles.
    ///
    /// Any resolution, parse, or loader error aborts the whole build and no
    /// partial graph is returned.
    pub fn build(&self, entry: &Path) -> Result<(ModuleKey, ModuleGraph)> {
        let entry_key = resolver::resolve_entry(self.root, entry)?;
        debug!(entry = %entry_key, "building module graph");

        let mut graph = ModuleGraph::default();
        let mut pending = vec![entry_key.clone()];

        while let Some(key) = pending.pop() {
            if graph.contains(&key) {
                // cycle / shared-dependency guard
                continue;
            }

            let path = key.to_path(self.root);
            let (raw, content_hash) = reader::read(&path)?;
            let processed = self.pipeline.apply(&key, raw)?;
            let (code, dependencies) = rewrite::rewrite(&processed, &key, self.root)?;
            trace!(module = %key, deps = dependencies.len(), "module processed");

            for dep in &dependencies {
                if !graph.contains(dep) {
                    pending.push(dep.clone());
                }
            }
            graph.insert(ModuleRecord {
                key: key.clone(),
                code,
                dependencies,
                content_hash,
            });
        }

        debug_assert!(graph.is_closed());
        debug!(modules = graph.len(), "module graph complete");
        Ok((entry_key, graph))
    }
}
