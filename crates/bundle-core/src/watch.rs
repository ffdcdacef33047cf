//! Watch controller (§4.8): the state machine that turns a stream of raw
//! filesystem change notifications into debounced, idempotent bundle
//! rebuilds.

use crate::cache::IncrementalCache;
use crate::error::Result;
use crate::system::{SystemInterface, WatchEvent};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

const DEBOUNCE: Duration = Duration::from_millis(250);

/// States the controller can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// No pending changes, no bundle in flight.
    Idle,
    /// A change arrived; waiting out the debounce window for more.
    Debouncing,
    /// A bundle pass is running.
    Bundling,
    /// A bundle pass is running, but another change arrived while it was
    /// in flight — rebuild again as soon as this pass finishes.
    BundlingDirty,
}

/// Events the controller reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A file changed.
    Change,
    /// The debounce timer elapsed.
    Tick,
    /// A bundle pass finished (successfully or not).
    PassDone,
    /// Watching stopped.
    Cancel,
}

/// What the driver should do in response to a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// (Re)start the debounce timer.
    StartDebounceTimer,
    /// Kick off a bundle pass.
    StartBundle,
    /// Nothing to do.
    None,
}

/// Pure state machine: no I/O, so it can be driven directly in tests.
#[derive(Debug, Default)]
pub struct WatchController {
    state: State,
    previous_bundle: Option<String>,
}

impl Default for State {
    fn default() -> Self {
        State::Idle
    }
}

/// Outcome of finishing a bundle pass, used to decide whether to notify
/// listeners (§ design notes: suppress re-emission of an identical
/// bundle).
pub struct PassOutcome {
    /// Transition effect from handling the implicit `PassDone` event.
    pub effect: Effect,
    /// Whether this pass's result differs from the last one emitted.
    pub emit: bool,
}

impl WatchController {
    /// Construct a controller in the idle state.
    pub fn new() -> Self {
        Self { state: State::Idle, previous_bundle: None }
    }

    /// Current state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Apply `event`, returning the effect the driver should perform.
    pub fn handle(&mut self, event: Event) -> Effect {
        use Event::*;
        use State::*;
        let (next, effect) = match (self.state, event) {
            (Idle, Change) => (Debouncing, Effect::StartDebounceTimer),
            (Debouncing, Change) => (Debouncing, Effect::StartDebounceTimer),
            (Debouncing, Tick) => (Bundling, Effect::StartBundle),
            (Bundling, Change) => (BundlingDirty, Effect::None),
            (BundlingDirty, Change) => (BundlingDirty, Effect::None),
            (Bundling, PassDone) => (Idle, Effect::None),
            (BundlingDirty, PassDone) => (Debouncing, Effect::StartDebounceTimer),
            (_, Cancel) => (Idle, Effect::None),
            (state, _) => (state, Effect::None),
        };
        self.state = next;
        effect
    }

    /// Record a finished bundle pass's result and decide whether it
    /// should be emitted: a bundle byte-identical to the last one emitted
    /// is suppressed, since nothing downstream needs to re-consume it.
    pub fn finish_pass(&mut self, result: &Result<String>) -> PassOutcome {
        let emit = match result {
            Ok(text) => {
                let changed = self.previous_bundle.as_deref() != Some(text.as_str());
                if changed {
                    self.previous_bundle = Some(text.clone());
                }
                changed
            }
            Err(_) => false,
        };
        PassOutcome { effect: self.handle(Event::PassDone), emit }
    }
}

/// A collaborator capable of producing one bundle pass. Implemented by
/// wrapping a [`crate::bundler::Bundler`] with its fixed build options.
#[async_trait]
pub trait BundleBuilder: Send + Sync {
    /// Run one bundle pass.
    async fn build(&self) -> Result<String>;
}

/// Notified of watch-loop lifecycle events, mirroring the
/// `compilationStarting` / `compilationFinished` / `bundleUpdated` events
/// in the design notes.
pub trait WatchSink: Send + Sync {
    /// A bundle pass is starting.
    fn compilation_starting(&self) {}
    /// A bundle pass finished (successfully or not).
    fn compilation_finished(&self, result: &Result<()>) {
        let _ = result;
    }
    /// A new, distinct bundle was produced.
    fn bundle_updated(&self, bundle: &str) {
        let _ = bundle;
    }
}

/// Drive the watch controller against a real change stream until the
/// channel closes.
///
/// Incoming events are first deduplicated against `cache` by mtime, since a
/// single logical edit can reach `changes` as two or three raw filesystem
/// notifications (editors that save via temp-file-plus-rename are the usual
/// culprit); only a genuine change reaches the state machine.
pub async fn run(
    sys: &dyn SystemInterface,
    mut changes: UnboundedReceiver<WatchEvent>,
    builder: &dyn BundleBuilder,
    sink: &dyn WatchSink,
) {
    let mut controller = WatchController::new();
    let cache = IncrementalCache::new();

    loop {
        match controller.state() {
            State::Idle => match changes.recv().await {
                Some(event) => {
                    if is_real_change(sys, &cache, &event).await {
                        debug!(?event, "watch: change while idle");
                        controller.handle(Event::Change);
                    }
                }
                None => return,
            },
            State::Debouncing => {
                tokio::select! {
                    maybe = changes.recv() => {
                        match maybe {
                            Some(event) => {
                                if is_real_change(sys, &cache, &event).await {
                                    controller.handle(Event::Change);
                                }
                            }
                            None => return,
                        }
                    }
                    _ = sys.sleep(DEBOUNCE) => {
                        if matches!(controller.handle(Event::Tick), Effect::StartBundle) {
                            run_one_pass(sys, &cache, &mut controller, &mut changes, builder, sink).await;
                        }
                    }
                }
            }
            // `run_one_pass` resolves Bundling/BundlingDirty back down to
            // Idle or Debouncing before returning, so the driver never
            // observes these states at the top of the loop.
            State::Bundling | State::BundlingDirty => unreachable!("resolved inside run_one_pass"),
        }
    }
}

/// Whether `event` represents a real change rather than a duplicate
/// notification for the same edit. Removals always count, and also clear
/// the path from the cache so a later recreation is seen fresh.
async fn is_real_change(sys: &dyn SystemInterface, cache: &IncrementalCache, event: &WatchEvent) -> bool {
    match event {
        WatchEvent::Changed(path) => {
            let mtime = sys.mtime_ms(path).await.ok().flatten();
            cache.note_change(path, mtime).await
        }
        WatchEvent::Removed(path) => {
            cache.invalidate(path).await;
            true
        }
    }
}

async fn run_one_pass(
    sys: &dyn SystemInterface,
    cache: &IncrementalCache,
    controller: &mut WatchController,
    changes: &mut UnboundedReceiver<WatchEvent>,
    builder: &dyn BundleBuilder,
    sink: &dyn WatchSink,
) {
    sink.compilation_starting();
    let build_fut = builder.build();
    tokio::pin!(build_fut);

    let result = loop {
        tokio::select! {
            result = &mut build_fut => break result,
            maybe = changes.recv() => {
                match maybe {
                    Some(event) => {
                        if is_real_change(sys, cache, &event).await {
                            controller.handle(Event::Change);
                        }
                    }
                    None => {}
                }
            }
        }
    };

    sink.compilation_finished(&result.as_ref().map(|_| ()).map_err(clone_error));
    let outcome = controller.finish_pass(&result);
    if outcome.emit {
        if let Ok(text) = &result {
            sink.bundle_updated(text);
        }
    }
}

fn clone_error(err: &crate::error::BundleError) -> crate::error::BundleError {
    match err {
        crate::error::BundleError::Unresolvable(v) => crate::error::BundleError::Unresolvable(v.clone()),
        crate::error::BundleError::CommonJsDetected(v) => crate::error::BundleError::CommonJsDetected(v.clone()),
        crate::error::BundleError::CompilationFailed(n) => crate::error::BundleError::CompilationFailed(*n),
        crate::error::BundleError::Minifier(m) => crate::error::BundleError::Minifier(m.clone()),
        crate::error::BundleError::Io { path, source } => {
            crate::error::BundleError::Io { path: path.clone(), source: std::io::Error::new(source.kind(), source.to_string()) }
        }
        crate::error::BundleError::Json { path, source } => {
            crate::error::BundleError::Io {
                path: path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, source.to_string()),
            }
        }
        crate::error::BundleError::Utf8(p) => crate::error::BundleError::Utf8(p.clone()),
    }
}
