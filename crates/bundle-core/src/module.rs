//! The in-memory module record the bundler core builds up while draining
//! the pending queue (§3).
//!
//! `source` holds the module's *final* JS text — after `"use strict"`
//! stripping, source-map trimming and (optionally) minification — rather
//! than a retained AST. The scanner and rewriter each parse transiently
//! and drop their arena when done; nothing here needs to outlive a single
//! pass, and threading an `oxc_allocator::Allocator`-backed AST through
//! the module table would make every consumer generic over its lifetime
//! for no benefit downstream.

/// One asset reachable from the entrypoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// POSIX-form asset name, e.g. `/agent/index.js`.
    pub name: String,
    /// Final JS source text, after rewriting.
    pub source: String,
    /// Other reference strings that resolved to this same module (§3):
    /// `node:buffer` and `buffer` both alias the same shim module, a
    /// `package.json`-driven directory resolution aliases the directory
    /// specifier to the file it resolved to, and so on.
    pub aliases: Vec<String>,
    /// Source map text, if one was recovered or generated for this
    /// module.
    pub map: Option<String>,
    /// Whether this module is the bundle's entrypoint — the assembler
    /// emits it first regardless of sort order.
    pub is_entry: bool,
}

impl Module {
    /// Construct a non-entry module with no aliases or source map yet.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self { name: name.into(), source: source.into(), aliases: Vec::new(), map: None, is_entry: false }
    }
}
