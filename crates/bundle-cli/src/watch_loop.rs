//! Wires the `notify` filesystem watcher and the bundler into
//! `bundle_core::watch`'s driver.

use async_trait::async_trait;
use bundle_core::error::{BundleError, Result};
use bundle_core::frontend::{CompilerOptions, FrontEnd, Severity};
use bundle_core::system::{SystemInterface, WatchEvent};
use bundle_core::watch::{BundleBuilder, WatchSink};
use bundle_core::{AssetCatalog, BundleOptions, Bundler};
use notify::{Event as NotifyEvent, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{error, info, warn};

/// Start watching `root` recursively, returning the live watcher (which
/// must stay alive for as long as events are wanted) and the channel its
/// events are forwarded onto.
pub fn spawn_watcher(root: &Path) -> notify::Result<(RecommendedWatcher, UnboundedReceiver<WatchEvent>)> {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<NotifyEvent>| match res {
        Ok(event) => {
            let make_event: fn(PathBuf) -> WatchEvent =
                if matches!(event.kind, EventKind::Remove(_)) { WatchEvent::Removed } else { WatchEvent::Changed };
            for path in event.paths {
                let _ = tx.send(make_event(path));
            }
        }
        Err(err) => warn!(%err, "watch event error"),
    })?;
    watcher.watch(root, RecursiveMode::Recursive)?;
    Ok((watcher, rx))
}

/// Recompiles the project through the front end, then rebuilds the bundle
/// from a fixed [`BundleOptions`], on every pass — §4.4 step 1 requires
/// project sources to come from the front end's output on every build,
/// not just the first one.
pub struct CliBundleBuilder<'a> {
    pub sys: &'a dyn SystemInterface,
    pub catalog: AssetCatalog,
    pub minifier: Option<&'a dyn bundle_core::minifier::Minifier>,
    pub options: BundleOptions,
    pub front_end: Arc<dyn FrontEnd>,
    pub compiler_options: CompilerOptions,
}

#[async_trait]
impl<'a> BundleBuilder for CliBundleBuilder<'a> {
    async fn build(&self) -> Result<String> {
        let write_file = |path: &Path, code: &str| -> Result<()> { write_compiled_file(path, code) };
        let diagnostics = self.front_end.emit(&self.compiler_options, &[], &write_file).await?;
        let error_count = diagnostics.iter().filter(|d| matches!(d.severity, Severity::Error)).count();
        for diagnostic in &diagnostics {
            match diagnostic.severity {
                Severity::Error => warn!(message = %diagnostic.message, "compilation error"),
                Severity::Warning => warn!(message = %diagnostic.message, "compilation warning"),
            }
        }
        if error_count > 0 {
            return Err(BundleError::CompilationFailed(error_count));
        }

        let bundler = Bundler::new(self.sys, self.catalog.clone(), self.minifier);
        bundler.build(&self.options).await
    }
}

/// Writes one front-end-emitted file to disk. The front end's write hook
/// is a synchronous `Fn`, so this goes through blocking `std::fs` calls
/// directly rather than the async [`SystemInterface`].
pub(crate) fn write_compiled_file(path: &Path, code: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| BundleError::Io { path: parent.to_path_buf(), source })?;
    }
    std::fs::write(path, code).map_err(|source| BundleError::Io { path: path.to_path_buf(), source })
}

/// Writes each emitted bundle to the configured output (or stdout) and
/// logs lifecycle events.
pub struct CliSink {
    pub output: Option<PathBuf>,
}

impl WatchSink for CliSink {
    fn compilation_starting(&self) {
        info!("bundling...");
    }

    fn compilation_finished(&self, result: &Result<()>) {
        match result {
            Ok(()) => info!("bundle complete"),
            Err(err) => error!(%err, "bundle failed"),
        }
    }

    fn bundle_updated(&self, bundle: &str) {
        match &self.output {
            Some(path) => {
                if let Err(err) = std::fs::write(path, bundle) {
                    error!(%err, path = %path.display(), "failed to write bundle");
                }
            }
            None => println!("{bundle}"),
        }
    }
}
