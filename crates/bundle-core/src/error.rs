//! Error types for the bundler core.
//!
//! Mirrors the error taxonomy in the design doc: the bundler accumulates
//! failures within a single pass and only reports after the drain loop
//! closes, so most of these variants carry a *list* rather than a single
//! offender.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while building or watching a bundle.
#[derive(Debug, Error)]
pub enum BundleError {
    /// One or more references could not be resolved to a concrete asset
    /// after the pending queue drained.
    #[error("unresolvable reference(s): {}", .0.join(", "))]
    Unresolvable(Vec<String>),

    /// One or more reachable modules were classified as CommonJS.
    #[error("CommonJS module(s) detected: {}", .0.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", "))]
    CommonJsDetected(Vec<PathBuf>),

    /// A front-end diagnostic at `error` severity was reported.
    #[error("compilation failed with {0} error(s)")]
    CompilationFailed(usize),

    /// The minifier collaborator failed.
    #[error("minifier error: {0}")]
    Minifier(String),

    /// I/O failure from the system interface, reading a file the resolver
    /// believed to exist.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that the operation targeted.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A `package.json` or JSON module failed to parse.
    #[error("invalid JSON at {path}: {source}")]
    Json {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A source file was not valid UTF-8.
    #[error("{0} is not valid UTF-8")]
    Utf8(PathBuf),
}

/// Result alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, BundleError>;
