//! Persisted fingerprint manifest gating bundle emission.
//!
//! The manifest records the content fingerprint of every module in the last
//! successfully emitted bundle. When a new build produces an identical
//! mapping, rendering and writing the bundle is skipped entirely. An absent
//! or corrupt manifest is a cache miss, never a failure.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::graph::{ModuleGraph, ModuleKey};
use crate::{Error, Result};

/// Manifest file name inside the output directory.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Mapping of module key to uppercase-hex content fingerprint.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<ModuleKey, String>,
}

impl Manifest {
    /// Snapshot the fingerprints of a freshly built graph.
    pub fn from_graph(graph: &ModuleGraph) -> Self {
        Self {
            entries: graph
                .records()
                .map(|record| (record.key.clone(), record.content_hash.clone()))
                .collect(),
        }
    }

    /// Load the manifest persisted by the previous emission.
    ///
    /// A missing file is a cold start and a corrupt file is discarded; both
    /// yield an empty manifest so the build re-emits.
    pub fn load(output_dir: &Path) -> Self {
        let path = output_dir.join(MANIFEST_FILE_NAME);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(_) => {
                debug!(path = %path.display(), "no previous manifest");
                return Self::default();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(entries) => Self { entries },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding corrupt manifest");
                Self::default()
            }
        }
    }

    /// Persist the manifest after a successful emission.
    pub fn save(&self, output_dir: &Path) -> Result<()> {
        fs::create_dir_all(output_dir).map_err(|e| Error::Io {
            message: format!(
                "failed to create output directory '{}'",
                output_dir.display()
            ),
            source: e,
        })?;
        let path = output_dir.join(MANIFEST_FILE_NAME);
        let json = serde_json::to_vec_pretty(&self.entries).map_err(|e| Error::Io {
            message: "failed to encode manifest".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;
        fs::write(&path, json).map_err(|e| Error::Io {
            message: format!("failed to write manifest '{}'", path.display()),
            source: e,
        })?;
        Ok(())
    }

    pub fn get(&self, key: &ModuleKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ModuleRecord;

    fn graph_with(pairs: &[(&str, &str)]) -> ModuleGraph {
        let mut graph = ModuleGraph::default();
        for (key, hash) in pairs {
            graph.insert(ModuleRecord {
                key: ModuleKey::new(*key),
                code: String::new(),
                dependencies: vec![],
                content_hash: (*hash).to_string(),
            });
        }
        graph
    }

    #[test]
    fn missing_manifest_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Manifest::load(dir.path()).is_empty());
    }

    #[test]
    fn corrupt_manifest_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(MANIFEST_FILE_NAME), "{not json").unwrap();
        assert!(Manifest::load(dir.path()).is_empty());
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = Manifest::from_graph(&graph_with(&[
            ("./src/a.js", "AA11"),
            ("./src/b.js", "BB22"),
        ]));
        manifest.save(dir.path()).unwrap();

        let loaded = Manifest::load(dir.path());
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.get(&ModuleKey::new("./src/a.js")), Some("AA11"));
    }

    #[test]
    fn equality_tracks_content_changes() {
        let unchanged = Manifest::from_graph(&graph_with(&[("./a.js", "AA")]));
        let same = Manifest::from_graph(&graph_with(&[("./a.js", "AA")]));
        let changed = Manifest::from_graph(&graph_with(&[("./a.js", "BB")]));
        let grown = Manifest::from_graph(&graph_with(&[("./a.js", "AA"), ("./b.js", "CC")]));

        assert_eq!(unchanged, same);
        assert_ne!(unchanged, changed);
        assert_ne!(unchanged, grown);
    }
}
