//! Lightweight incremental cache for watch mode.
//!
//! `notify` delivers one event per filesystem write syscall, which for
//! editors that save via a temp-file-plus-rename can mean two or three
//! events for what is, from the bundler's point of view, a single
//! change. This cache remembers the last modification time observed for
//! each watched path so the watch controller can collapse duplicate
//! notifications before they trigger a rebuild.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Tracks per-path modification times across watch-mode passes.
#[derive(Debug, Default)]
pub struct IncrementalCache {
    mtimes: RwLock<HashMap<PathBuf, Option<u64>>>,
}

impl IncrementalCache {
    /// Construct an empty cache.
    pub fn new() -> Self {
        Self { mtimes: RwLock::new(HashMap::new()) }
    }

    /// Record an observed mtime for `path`, returning `true` if this is
    /// different from what was last recorded (or `path` is new to the
    /// cache) — i.e. whether this notification represents a real change.
    pub async fn note_change(&self, path: &Path, mtime_ms: Option<u64>) -> bool {
        let mut guard = self.mtimes.write().await;
        let changed = guard.get(path) != Some(&mtime_ms);
        guard.insert(path.to_path_buf(), mtime_ms);
        changed
    }

    /// Forget a path, e.g. after it's deleted.
    pub async fn invalidate(&self, path: &Path) {
        self.mtimes.write().await.remove(path);
    }

    /// Drop all recorded state, forcing the next change on every path to
    /// register as real.
    pub async fn clear(&self) {
        self.mtimes.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_observation_is_always_a_change() {
        let cache = IncrementalCache::new();
        assert!(cache.note_change(Path::new("/a.js"), Some(100)).await);
    }

    #[tokio::test]
    async fn repeated_same_mtime_is_not_a_change() {
        let cache = IncrementalCache::new();
        cache.note_change(Path::new("/a.js"), Some(100)).await;
        assert!(!cache.note_change(Path::new("/a.js"), Some(100)).await);
    }

    #[tokio::test]
    async fn differing_mtime_is_a_change() {
        let cache = IncrementalCache::new();
        cache.note_change(Path::new("/a.js"), Some(100)).await;
        assert!(cache.note_change(Path::new("/a.js"), Some(200)).await);
    }

    #[tokio::test]
    async fn invalidate_forces_next_observation_to_be_a_change() {
        let cache = IncrementalCache::new();
        cache.note_change(Path::new("/a.js"), Some(100)).await;
        cache.invalidate(Path::new("/a.js")).await;
        assert!(cache.note_change(Path::new("/a.js"), Some(100)).await);
    }
}
