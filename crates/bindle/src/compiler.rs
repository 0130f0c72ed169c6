//! The build session: orchestrates hooks, graph construction, the cache
//! decision, and emission.
//!
//! A [`Compiler`] is constructed once per build invocation. Plugins are
//! applied at construction; `run` fires the lifecycle hooks around each
//! phase. Any fatal error is surfaced through the `failed` hook and then
//! returned; no partial bundle is written and a previously emitted bundle
//! stays untouched on disk.

use std::path::PathBuf;

use path_clean::PathClean;
use tracing::{debug, info, warn};

use crate::cache::Manifest;
use crate::config::BuildConfig;
use crate::graph::{GraphBuilder, ModuleKey};
use crate::hooks::{HookContext, HookSet};
use crate::transform::LoaderPipeline;
use crate::{emit, Error, Result};

/// What a finished build produced.
#[derive(Debug, Clone)]
pub struct BuildSummary {
    /// Canonical key of the entry module.
    pub entry_key: ModuleKey,
    /// Number of modules in the graph.
    pub module_count: usize,
    /// False when the manifest matched the previous build and the bundle on
    /// disk was left as is.
    pub emitted: bool,
    /// Path of the bundle, written by this run or assumed valid from the
    /// previous one.
    pub output_path: PathBuf,
}

/// One build session. Create a fresh compiler per build; sessions share no
/// state with each other.
pub struct Compiler {
    config: BuildConfig,
    root: PathBuf,
    hooks: HookSet,
}

impl Compiler {
    /// Construct the session and apply every configured plugin.
    pub fn new(config: BuildConfig) -> Result<Self> {
        let root = match &config.root {
            Some(root) => root.clone(),
            None => std::env::current_dir().map_err(|e| Error::Io {
                message: "failed to determine the project root".to_string(),
                source: e,
            })?,
        }
        .clean();

        let mut hooks = HookSet::new();
        for plugin in &config.plugins {
            debug!(plugin = plugin.name(), "applying plugin");
            plugin.apply(&mut hooks);
        }

        Ok(Self {
            config,
            root,
            hooks,
        })
    }

    /// The session's hooks, for subscriptions made outside of a plugin.
    pub fn hooks(&mut self) -> &mut HookSet {
        &mut self.hooks
    }

    /// Run the build: `before_run`, `before_compile`, graph walk,
    /// `after_compile`, `emit`, cache-gated emission, `after_run`.
    pub async fn run(&self) -> Result<BuildSummary> {
        self.config.validate()?;
        match self.build().await {
            Ok(summary) => Ok(summary),
            Err(error) => {
                let ctx = HookContext {
                    config: &self.config,
                    graph: None,
                    error: Some(&error),
                };
                if let Err(hook_error) = self.hooks.failed.call(&ctx).await {
                    warn!(error = %hook_error, "failed hook itself failed");
                }
                Err(error)
            }
        }
    }

    async fn build(&self) -> Result<BuildSummary> {
        let ctx = HookContext {
            config: &self.config,
            graph: None,
            error: None,
        };
        self.hooks.before_run.call(&ctx).await?;
        self.hooks.before_compile.call(&ctx).await?;

        let pipeline = LoaderPipeline::new(&self.config.rules);
        let builder = GraphBuilder::new(&self.root, pipeline);
        let (entry_key, graph) = builder.build(&self.config.entry)?;

        let ctx = HookContext {
            config: &self.config,
            graph: Some(&graph),
            error: None,
        };
        self.hooks.after_compile.call(&ctx).await?;
        self.hooks.emit.call(&ctx).await?;

        let output_dir = self.config.manifest_dir();
        let output_path = output_dir.join(&self.config.output.file_name);
        let manifest = Manifest::from_graph(&graph);
        let previous = Manifest::load(output_dir);

        let emitted = if previous == manifest {
            info!(modules = graph.len(), "module fingerprints unchanged, skipping emission");
            false
        } else {
            let code = emit::render(&entry_key, &graph)?;
            let written = emit::write_bundle(output_dir, &self.config.output.file_name, &code)?;
            manifest.save(output_dir)?;
            info!(path = %written.display(), modules = graph.len(), "bundle written");
            true
        };

        self.hooks.after_run.call(&ctx).await?;

        Ok(BuildSummary {
            entry_key,
            module_count: graph.len(),
            emitted,
            output_path,
        })
    }
}
