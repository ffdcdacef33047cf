//! CLI entrypoint: parses arguments, resolves the project layout, and
//! runs either a single bundle pass or the watch-mode loop.

mod cli;
mod config;
mod error;
mod logging;
mod watch_loop;

use crate::cli::Args;
use crate::config::{apply_tsconfig_overlay, ProjectConfig};
use crate::error::CliError;
use bundle_core::error::BundleError;
use bundle_core::frontend::{CompilerOptions, Diagnostic, FrontEnd, Severity};
use bundle_core::watch;
use bundle_core::{AssetCatalog, BundleOptions, Bundler, NativeSystem, SystemInterface};
use bundle_oxc::{OxcFrontEnd, OxcMinifier};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

const SHIM_NAMESPACE: &str = "@bundle-shims";
const COMPILER_NAME: &str = "script-bundle";

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    let sys = NativeSystem::new();
    let entry = sys.realpath(&args.entry);
    let project_config = ProjectConfig::discover(&entry);
    let shim_dir = discover_shim_dir(&sys);

    let catalog = AssetCatalog::new(
        shim_dir,
        SHIM_NAMESPACE,
        project_config.project_root.clone(),
        project_config.compiler_root.clone(),
        COMPILER_NAME,
    );

    let tsconfig_path = project_config.project_root.join("tsconfig.json");
    let tsconfig_text = if sys.exists(&tsconfig_path) { sys.read_file(&tsconfig_path).await.ok() } else { None };
    let compiler_options = apply_tsconfig_overlay(
        CompilerOptions::baseline(project_config.project_root.clone(), project_config.compiler_root.clone()),
        tsconfig_text.as_deref(),
    );

    let front_end: Arc<dyn FrontEnd> = Arc::new(OxcFrontEnd::new(Arc::new(NativeSystem::new())));

    // §4.4 step 1: the front end's emitted output is the ground truth for
    // project sources; the entry the bundler starts from is therefore the
    // compiled path under `compiler_root`, not the authored TS/JS file.
    let compiled_entry = compiled_entry_path(&entry, &project_config.project_root, &project_config.compiler_root);
    let options = BundleOptions { entry: compiled_entry, compress: args.compress, sourcemaps: args.sourcemaps() };
    let minifier = OxcMinifier::new();
    let project_root = catalog.project_root.clone();

    if args.watch {
        run_watch(&sys, catalog, &minifier, options, args.output, &project_root, front_end, compiler_options).await
    } else {
        compile_project(front_end.as_ref(), &compiler_options).await?;
        run_once(&sys, catalog, &minifier, &options, args.output.as_deref()).await
    }
}

/// Derive the path the front end will have emitted an entrypoint to:
/// project-root-relative, re-rooted under `compiler_root`, with its
/// extension swapped to `.js` — mirrors `OxcFrontEnd::emit`'s own
/// per-file `out_path` computation.
fn compiled_entry_path(entry: &Path, project_root: &Path, compiler_root: &Path) -> PathBuf {
    let rel = entry.strip_prefix(project_root).unwrap_or(entry);
    compiler_root.join(rel).with_extension("js")
}

/// Run the front end once, report its diagnostics, and fail the build if
/// any are at `Severity::Error` (§7).
async fn compile_project(front_end: &dyn FrontEnd, compiler_options: &CompilerOptions) -> Result<(), CliError> {
    let write_file = |path: &Path, code: &str| -> bundle_core::error::Result<()> {
        watch_loop::write_compiled_file(path, code)
    };
    let diagnostics = front_end.emit(compiler_options, &[], &write_file).await?;
    let error_count = diagnostics.iter().filter(|d| matches!(d.severity, Severity::Error)).count();
    for diagnostic in &diagnostics {
        report_diagnostic(diagnostic);
    }
    if error_count > 0 {
        return Err(CliError::from(BundleError::CompilationFailed(error_count)));
    }
    Ok(())
}

fn report_diagnostic(diagnostic: &Diagnostic) {
    let location = match (&diagnostic.file, diagnostic.line) {
        (Some(file), Some(line)) => format!("{}:{line}: ", file.display()),
        (Some(file), None) => format!("{}: ", file.display()),
        _ => String::new(),
    };
    let label = match diagnostic.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    };
    eprintln!("{label}: {location}{}", diagnostic.message);
}

async fn run_once(
    sys: &NativeSystem,
    catalog: AssetCatalog,
    minifier: &OxcMinifier,
    options: &BundleOptions,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let bundler = Bundler::new(sys, catalog, Some(minifier));
    let bundle = bundler.build(options).await?;
    write_output(output, &bundle)
}

#[allow(clippy::too_many_arguments)]
async fn run_watch(
    sys: &NativeSystem,
    catalog: AssetCatalog,
    minifier: &OxcMinifier,
    options: BundleOptions,
    output: Option<PathBuf>,
    project_root: &Path,
    front_end: Arc<dyn FrontEnd>,
    compiler_options: CompilerOptions,
) -> Result<(), CliError> {
    let (_watcher, changes) =
        watch_loop::spawn_watcher(project_root).map_err(|e| CliError::Watch(e.to_string()))?;
    let builder = watch_loop::CliBundleBuilder {
        sys,
        catalog,
        minifier: Some(minifier),
        options,
        front_end,
        compiler_options,
    };
    let sink = watch_loop::CliSink { output };
    watch::run(sys, changes, &builder, &sink).await;
    Ok(())
}

fn write_output(output: Option<&Path>, bundle: &str) -> Result<(), CliError> {
    match output {
        Some(path) => {
            std::fs::write(path, bundle).map_err(|source| CliError::Output { path: path.to_path_buf(), source })
        }
        None => {
            println!("{bundle}");
            Ok(())
        }
    }
}

/// Locate the shim catalog: `BUNDLE_SHIM_DIR` if set, otherwise a
/// `shims/` directory alongside the running binary.
fn discover_shim_dir(sys: &NativeSystem) -> PathBuf {
    if let Some(dir) = sys.env("BUNDLE_SHIM_DIR") {
        return PathBuf::from(dir);
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("shims")))
        .unwrap_or_else(|| PathBuf::from("shims"))
}
