//! The pluggable project compiler contract (§6).
//!
//! The bundler core never type-checks or transpiles project sources
//! itself — that's the front end's job, and the front end is out of this
//! crate's scope by design (no bundled type checker is a non-goal).
//! `bundle-oxc` plugs in a transform-only front end built on
//! `oxc_transformer`; a real project would plug in its own TypeScript
//! binding here instead.

use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Compiler options a [`FrontEnd`] is asked to honor.
///
/// `module`, `module_resolution`, `root_dir`, `out_dir`, `source_map`,
/// `inline_source_map` and `no_emit` are hard requirements the bundler
/// depends on structurally (the assembler assumes ESM output rooted at
/// `out_dir`) — a `tsconfig.json` overlay may only ever adjust `target`,
/// `lib` and `strict`.
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// ECMAScript target, e.g. `"es2020"`.
    pub target: String,
    /// Library declarations to assume are globally available.
    pub lib: Vec<String>,
    /// Whether to apply strict type-checking rules.
    pub strict: bool,
    /// Module format to emit. Always `"esnext"` for this pipeline.
    pub module: String,
    /// Module resolution strategy the front end uses internally.
    pub module_resolution: String,
    /// Project source root.
    pub root_dir: PathBuf,
    /// Directory the front end emits compiled output into.
    pub out_dir: PathBuf,
    /// Whether to produce a `.map` file alongside each emitted file.
    pub source_map: bool,
    /// Whether to inline the source map as a data URL instead.
    pub inline_source_map: bool,
    /// Whether the front end should skip writing files itself and defer
    /// entirely to the `write_file` hook passed to [`FrontEnd::emit`].
    pub no_emit: bool,
}

impl CompilerOptions {
    /// A baseline suitable for a from-scratch project: ES2020 target, no
    /// extra lib entries, strict mode on, ESM output, writes deferred to
    /// the caller's hook.
    pub fn baseline(root_dir: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            target: "es2020".to_string(),
            lib: Vec::new(),
            strict: true,
            module: "esnext".to_string(),
            module_resolution: "bundler".to_string(),
            root_dir: root_dir.into(),
            out_dir: out_dir.into(),
            source_map: true,
            inline_source_map: false,
            no_emit: true,
        }
    }
}

/// Severity of a single diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fails the build once compilation finishes.
    Error,
    /// Surfaced to the user but does not fail the build.
    Warning,
}

/// One diagnostic reported by a [`FrontEnd`].
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Human-readable message.
    pub message: String,
    /// Source file the diagnostic points at, if any.
    pub file: Option<PathBuf>,
    /// 1-based line number, if known.
    pub line: Option<u32>,
    /// Severity.
    pub severity: Severity,
}

/// Hook invoked once per file the front end wants to emit, in place of
/// the front end writing the file itself.
pub type WriteHook<'a> = dyn Fn(&Path, &str) -> Result<()> + Send + Sync + 'a;

/// A text-to-text transform applied to one emitted file before the write
/// hook runs, keyed by that file's path.
pub type AfterTransform<'a> = dyn Fn(&Path, String) -> String + Send + Sync + 'a;

/// A pluggable project compiler: consumes project sources under
/// `options.root_dir` and produces ESM output, routed through
/// `write_file` rather than written directly to disk.
#[async_trait]
pub trait FrontEnd: Send + Sync {
    /// Compile the project once. Diagnostics at [`Severity::Error`]
    /// should cause the caller to fail the bundle with
    /// `BundleError::CompilationFailed`; the front end itself only
    /// reports them; it does not decide whether to fail.
    async fn emit(
        &self,
        options: &CompilerOptions,
        after_transformers: &[Box<AfterTransform<'_>>],
        write_file: &WriteHook<'_>,
    ) -> Result<Vec<Diagnostic>>;

    /// Start (or continue) a watch-mode compilation. `after_program_create`
    /// is invoked once per incremental build with that build's
    /// diagnostics, mirroring `ts.createWatchProgram`'s reporting hook.
    async fn watch(
        &self,
        options: &CompilerOptions,
        after_program_create: &(dyn Fn(&[Diagnostic]) + Send + Sync),
    ) -> Result<()>;
}
