//! Loader contract and the per-module transform pipeline.
//!
//! A loader is a synchronous, pure source-to-source transform. Loaders are
//! first-class values resolved at configuration time; the engine never loads
//! transform code dynamically by name. Rules pair a path pattern with an
//! ordered loader chain; the chain is treated as a stack, so the loader
//! declared last runs first.

use std::sync::Arc;

use regex::Regex;
use tracing::trace;

use crate::graph::ModuleKey;
use crate::{Error, Result};

/// A pure source-to-source transform applied before dependency rewriting.
pub trait Loader: Send + Sync {
    /// Name used in error reports and logs.
    fn name(&self) -> &str;

    fn transform(&self, source: String) -> Result<String>;
}

/// Adapter that turns a plain function into a [`Loader`].
pub struct FnLoader {
    name: String,
    func: Box<dyn Fn(String) -> Result<String> + Send + Sync>,
}

impl FnLoader {
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(String) -> Result<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }
}

impl Loader for FnLoader {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self, source: String) -> Result<String> {
        (self.func)(source)
    }
}

/// Pairs a path pattern with the loader chain to run on matching modules.
#[derive(Clone)]
pub struct LoaderRule {
    pub test: Regex,
    pub loaders: Vec<Arc<dyn Loader>>,
}

impl LoaderRule {
    pub fn new(test: Regex) -> Self {
        Self {
            test,
            loaders: Vec::new(),
        }
    }

    /// Append a loader to this rule's chain. Chains apply last-to-first.
    pub fn with(mut self, loader: Arc<dyn Loader>) -> Self {
        self.loaders.push(loader);
        self
    }
}

impl std::fmt::Debug for LoaderRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderRule")
            .field("test", &self.test.as_str())
            .field(
                "loaders",
                &self.loaders.iter().map(|l| l.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Applies every matching rule, in declaration order, to one module's source.
pub struct LoaderPipeline<'a> {
    rules: &'a [LoaderRule],
}

impl<'a> LoaderPipeline<'a> {
    pub fn new(rules: &'a [LoaderRule]) -> Self {
        Self { rules }
    }

    /// Thread `source` through every rule whose pattern matches the module
    /// key. Within one rule the chain runs last-to-first.
    pub fn apply(&self, key: &ModuleKey, mut source: String) -> Result<String> {
        for rule in self.rules {
            if !rule.test.is_match(key.as_str()) {
                continue;
            }
            for loader in rule.loaders.iter().rev() {
                trace!(module = %key, loader = loader.name(), "applying loader");
                source = loader.transform(source).map_err(|e| match e {
                    // a binding collision carries its own context
                    Error::DuplicateBinding { .. } => e,
                    other => Error::Loader {
                        loader: loader.name().to_string(),
                        module: key.to_string(),
                        message: other.to_string(),
                    },
                })?;
            }
        }
        Ok(source)
    }
}
