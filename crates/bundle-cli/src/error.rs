//! CLI-level error type: wraps [`BundleError`] with the argument- and
//! I/O-handling failures that only make sense at the CLI boundary.

use bundle_core::error::BundleError;
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Errors the CLI binary can report.
#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    /// A failure from the bundler core itself.
    #[error(transparent)]
    #[diagnostic(code(bundle::core))]
    Bundle(#[from] BundleError),

    /// Writing the assembled bundle to its output path failed.
    #[error("failed to write bundle to {path}: {source}")]
    #[diagnostic(code(bundle::output))]
    Output {
        /// Output path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file watcher could not be started.
    #[error("failed to start watching: {0}")]
    #[diagnostic(code(bundle::watch))]
    Watch(String),
}
