//! # bindle
//!
//! Bindle is a minimal CommonJS module bundler. Given an entry source file it
//! discovers every file transitively referenced through `require(...)` calls,
//! runs each file through configured loaders, rewrites module references to
//! canonical root-relative keys, and emits a single self-contained bundle that
//! executes the whole dependency graph without a native module loader.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bindle::{BuildConfig, Compiler};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BuildConfig::new("./src/index.js")
//!     .output_dir("dist")
//!     .file_name("bundle.js");
//!
//! let summary = Compiler::new(config)?.run().await?;
//! println!("bundled {} modules", summary.module_count);
//! # Ok(()) }
//! ```
//!
//! ## Extending a build
//!
//! Loaders are first-class transform values attached to path-matching rules,
//! and plugins subscribe to named lifecycle hooks on the build session:
//!
//! ```no_run
//! use bindle::{BuildConfig, LoaderRule};
//! use bindle::loaders::StripComments;
//! use regex::Regex;
//! use std::sync::Arc;
//!
//! let rule = LoaderRule::new(Regex::new(r"\.js$").unwrap()).with(Arc::new(StripComments));
//! let config = BuildConfig::new("./src/index.js").rule(rule);
//! ```

pub mod cache;
pub mod compiler;
pub mod config;
pub mod emit;
pub mod graph;
pub mod hooks;
pub mod loaders;
pub mod reader;
pub mod resolver;
pub mod rewrite;
pub mod transform;

// Logging utilities (optional, enabled with "logging" feature)
#[cfg(feature = "logging")]
pub mod logging;

#[cfg(feature = "logging")]
pub use logging::{LogLevel, init_logging, init_logging_from_env};

pub use cache::Manifest;
pub use compiler::{BuildSummary, Compiler};
pub use config::{BuildConfig, OutputConfig};
pub use graph::{ModuleGraph, ModuleKey, ModuleRecord};
pub use hooks::{Hook, HookContext, HookListener, HookSet, Plugin};
pub use rewrite::RUNTIME_REQUIRE;
pub use transform::{FnLoader, Loader, LoaderRule};

/// Error types for bindle operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A module specifier did not resolve to an existing file or package key.
    #[error("cannot resolve '{specifier}' from '{from}': {reason}")]
    Resolution {
        specifier: String,
        from: String,
        reason: String,
    },

    /// A module's source is not syntactically valid.
    #[error("parse error in '{module}': {message}")]
    Parse { module: String, message: String },

    /// A loader rejected a module's source.
    #[error("loader '{loader}' failed on '{module}': {message}")]
    Loader {
        loader: String,
        module: String,
        message: String,
    },

    /// A transform introduced a binding name that already exists and cannot
    /// safely be rewritten.
    #[error("duplicate binding '{name}' cannot be rewritten")]
    DuplicateBinding { name: String },

    /// A hook listener failed while a lifecycle phase was firing.
    #[error("hook '{hook}' failed: {message}")]
    Hook {
        hook: &'static str,
        message: String,
    },

    /// I/O error with context message.
    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing the output bundle failed.
    #[error("write failure: {0}")]
    WriteFailure(String),

    /// Output path escapes the output directory or is otherwise unusable.
    #[error("invalid output path: {0}")]
    InvalidOutputPath(String),

    /// Invalid build configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The bundle bootstrap template failed to render.
    #[error("bundle template error: {0}")]
    Template(#[from] minijinja::Error),
}

/// Result type alias for bindle operations.
pub type Result<T> = std::result::Result<T, Error>;

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Resolution { .. } => "RESOLUTION_ERROR",
            Error::Parse { .. } => "PARSE_ERROR",
            Error::Loader { .. } => "LOADER_ERROR",
            Error::DuplicateBinding { .. } => "DUPLICATE_BINDING",
            Error::Hook { .. } => "HOOK_ERROR",
            Error::Io { .. } => "IO_ERROR",
            Error::WriteFailure(_) => "WRITE_FAILURE",
            Error::InvalidOutputPath(_) => "INVALID_OUTPUT_PATH",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Template(_) => "TEMPLATE_ERROR",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::Resolution { specifier, .. } => Some(Box::new(format!(
                "Check that '{}' exists relative to the referencing module, or that the package directory is present under node_modules.",
                specifier
            ))),
            Error::Parse { module, .. } => Some(Box::new(format!(
                "'{}' must be syntactically valid JavaScript before dependency rewriting. If it needs pre-processing, attach a loader rule matching its path.",
                module
            ))),
            Error::InvalidConfig(msg) => Some(Box::new(format!(
                "Check the build configuration.\nError: {}",
                msg
            ))),
            Error::WriteFailure(_) => Some(Box::new(
                "Failed to write the bundle. Check disk space and permissions.".to_string(),
            )),
            _ => None,
        }
    }
}
