//! Pluggable CommonJS-to-ESM transform (§9 design notes).
//!
//! The default pipeline rejects any reachable CJS module outright
//! (`BundleError::CommonJsDetected`) rather than rewriting it — CJS's
//! `module.exports`/`exports.x =` patterns are assignment-shaped, not
//! declaration-shaped, and faithfully turning arbitrary CJS into ESM
//! requires control-flow analysis this bundler doesn't do. The trait
//! exists so a host that needs that transform can supply it without
//! forking the traversal loop; the bundler core never calls it today.

use crate::error::Result;
use async_trait::async_trait;

/// Result of transforming one CJS file into ESM.
#[derive(Debug, Clone)]
pub struct CjsOutput {
    /// Rewritten ESM source text.
    pub source: String,
    /// Source map from CJS to ESM, if the transformer produces one.
    pub map: Option<String>,
}

/// A collaborator capable of rewriting a CommonJS module into an
/// equivalent ES module.
#[async_trait]
pub trait CjsToEsm: Send + Sync {
    /// Transform `source`, which came from `filename`.
    async fn transform(&self, filename: &str, source: &str) -> Result<CjsOutput>;
}
