//! Build configuration types.
//!
//! A [`BuildConfig`] is assembled with builder-style methods, validated once,
//! and stays immutable for the duration of a build.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::hooks::Plugin;
use crate::transform::LoaderRule;
use crate::{Error, Result};

/// Where the bundle and its manifest land.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub file_name: String,
}

/// Configuration for one build session.
pub struct BuildConfig {
    /// Entry source file, relative to the project root.
    pub entry: PathBuf,

    /// Output directory and bundle file name.
    pub output: OutputConfig,

    /// Loader rules, applied in declaration order.
    pub rules: Vec<LoaderRule>,

    /// Plugins applied at session construction.
    pub plugins: Vec<Arc<dyn Plugin>>,

    /// Project root all module keys are relative to. Defaults to the current
    /// working directory.
    pub root: Option<PathBuf>,
}

impl BuildConfig {
    pub fn new(entry: impl Into<PathBuf>) -> Self {
        Self {
            entry: entry.into(),
            output: OutputConfig {
                dir: PathBuf::from("dist"),
                file_name: "bundle.js".to_string(),
            },
            rules: Vec::new(),
            plugins: Vec::new(),
            root: None,
        }
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output.dir = dir.into();
        self
    }

    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.output.file_name = file_name.into();
        self
    }

    pub fn rule(mut self, rule: LoaderRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Check internal consistency before a build starts.
    pub fn validate(&self) -> Result<()> {
        if self.entry.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("entry path is empty".into()));
        }
        if self.output.file_name.is_empty() {
            return Err(Error::InvalidConfig("output file name is empty".into()));
        }
        if self.output.file_name.contains(['/', '\\']) {
            return Err(Error::InvalidConfig(format!(
                "output file name '{}' must not contain path separators",
                self.output.file_name
            )));
        }
        Ok(())
    }

    pub(crate) fn manifest_dir(&self) -> &Path {
        &self.output.dir
    }
}

impl std::fmt::Debug for BuildConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildConfig")
            .field("entry", &self.entry)
            .field("output", &self.output)
            .field("rules", &self.rules)
            .field("plugins", &self.plugins.len())
            .field("root", &self.root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_dist_bundle_js() {
        let config = BuildConfig::new("./src/index.js");
        assert_eq!(config.output.dir, Path::new("dist"));
        assert_eq!(config.output.file_name, "bundle.js");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_entry_is_invalid() {
        let config = BuildConfig::new("");
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn file_name_with_separator_is_invalid() {
        let config = BuildConfig::new("./src/index.js").file_name("nested/bundle.js");
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfig(_))
        ));
    }
}
