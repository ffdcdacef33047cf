//! Command-line argument surface (§6).

use clap::Parser;
use std::path::PathBuf;

/// Bundles a script entrypoint and its dependencies into one file.
#[derive(Debug, Parser)]
#[command(name = "bundle", version, about)]
pub struct Args {
    /// Entrypoint script to bundle.
    pub entry: PathBuf,

    /// Write the bundle to this path instead of stdout.
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Rebuild whenever a reachable source file changes.
    #[arg(short = 'w', long = "watch")]
    pub watch: bool,

    /// Omit source maps from the bundle. Source maps are included by
    /// default.
    #[arg(short = 'S', long = "no-sourcemaps")]
    pub no_sourcemaps: bool,

    /// Minify each module's emitted JS.
    #[arg(short = 'c', long = "compress")]
    pub compress: bool,
}

impl Args {
    /// Whether source maps should be produced for this invocation.
    pub fn sourcemaps(&self) -> bool {
        !self.no_sourcemaps
    }
}
