//! The pluggable minifier contract (§6).
//!
//! The core crate ships no minifier of its own — `bundle-oxc` provides the
//! default implementation on top of `oxc_minifier`. Anything implementing
//! this trait can be swapped in instead.

use crate::error::Result;
use async_trait::async_trait;

/// Result of minifying one file.
#[derive(Debug, Clone)]
pub struct MinifyOutput {
    /// Minified source text.
    pub code: String,
    /// Source map text, present when source maps were requested and the
    /// minifier supports producing (or merging) them.
    pub map: Option<String>,
}

/// Options threaded through to the minifier for one invocation.
#[derive(Debug, Clone, Default)]
pub struct MinifyOptions {
    /// Whether a source map should be produced/merged.
    pub sourcemaps: bool,
}

/// A collaborator capable of minifying a single file's JS text.
#[async_trait]
pub trait Minifier: Send + Sync {
    /// Minify `source`, which came from `filename` (used for diagnostics
    /// and as the map's `file` field). `existing_map`, when present, is
    /// the incoming source map to merge against so mapped positions still
    /// point back to the original author's source rather than the
    /// bundler's intermediate output.
    async fn minify(
        &self,
        filename: &str,
        source: &str,
        existing_map: Option<&str>,
        options: &MinifyOptions,
    ) -> Result<MinifyOutput>;
}
