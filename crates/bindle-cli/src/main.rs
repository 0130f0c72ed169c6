//! Bindle CLI - bundle a CommonJS project from the command line.
//!
//! Parses arguments, assembles a build configuration with the stock loader
//! rules, runs one build session, and reports errors as miette diagnostics.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use regex::Regex;

use bindle::loaders::{EsmToCjs, StripComments};
use bindle::{BuildConfig, Compiler, LoaderRule, LogLevel};

mod log_plugin;

use log_plugin::LogPlugin;

#[derive(Debug, Parser)]
#[command(name = "bindle", version, about = "Minimal CommonJS module bundler")]
struct Cli {
    /// Entry source file, relative to the project root
    entry: PathBuf,

    /// Project root all module keys are relative to
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Output directory for the bundle and its manifest
    #[arg(long, default_value = "dist")]
    out_dir: PathBuf,

    /// Bundle file name inside the output directory
    #[arg(long, default_value = "bundle.js")]
    out_file: String,

    /// Rewrite default-import/-export ESM syntax to CommonJS before bundling
    #[arg(long)]
    esm: bool,

    /// Strip comments from matching sources before bundling
    #[arg(long)]
    strip_comments: bool,

    /// Log level (silent, error, warn, info, debug)
    #[arg(long, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    bindle::init_logging(cli.log_level);

    let mut config = BuildConfig::new(cli.entry)
        .root(cli.root)
        .output_dir(cli.out_dir)
        .file_name(cli.out_file)
        .plugin(Arc::new(LogPlugin));

    let js = Regex::new(r"\.(js|jsx)$").expect("static pattern");
    if cli.strip_comments {
        config = config.rule(LoaderRule::new(js.clone()).with(Arc::new(StripComments)));
    }
    if cli.esm {
        config = config.rule(LoaderRule::new(js).with(Arc::new(EsmToCjs)));
    }

    let compiler = Compiler::new(config).map_err(miette::Report::new)?;
    let summary = compiler.run().await.map_err(miette::Report::new)?;

    if !summary.emitted {
        tracing::info!(
            path = %summary.output_path.display(),
            "nothing changed, existing bundle is current"
        );
    }
    Ok(())
}
