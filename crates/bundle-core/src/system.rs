//! System interface: the abstract capability set the bundler core needs
//! from its host (§2 item 2, §6).
//!
//! Two conforming implementations are expected to exist outside this
//! crate — a native one backed by `std`/`tokio::fs`/`notify`, and an
//! in-memory one for embedding inside another process. [`NativeSystem`]
//! below is the native implementation, grounded in `fob`'s
//! `NativeRuntime`; it also demonstrates the shape an embedder is
//! expected to fill in.

use crate::error::{BundleError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A single filesystem change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// The watched path was created or modified.
    Changed(PathBuf),
    /// The watched path was removed.
    Removed(PathBuf),
}

/// Capability set the bundler core needs from its host environment.
///
/// All I/O is routed through this trait so the core stays synchronous and
/// platform-agnostic (§5): a host may back it with blocking `std::fs`
/// calls wrapped in `spawn_blocking`, or with an in-memory filesystem for
/// embedding.
#[async_trait]
pub trait SystemInterface: Send + Sync {
    /// Read a file's contents as UTF-8 text.
    async fn read_file(&self, path: &Path) -> Result<String>;

    /// Write UTF-8 text to a file, creating parent directories as needed.
    async fn write_file(&self, path: &Path, contents: &str) -> Result<()>;

    /// Whether a path exists at all (file or directory).
    fn exists(&self, path: &Path) -> bool;

    /// Whether a path exists and is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// List the immediate entries of a directory (file/dir names, not
    /// full paths).
    async fn read_dir(&self, path: &Path) -> Result<Vec<String>>;

    /// Resolve symlinks and `.`/`..` components against the real
    /// filesystem. Falls back to lexical normalization when the path
    /// doesn't exist yet.
    fn realpath(&self, path: &Path) -> PathBuf;

    /// Last-modified time in milliseconds since the Unix epoch, if known.
    async fn mtime_ms(&self, path: &Path) -> Result<Option<u64>>;

    /// Decode a base64 payload (used for inline `sourceMappingURL` data
    /// URLs).
    fn base64_decode(&self, data: &str) -> Result<Vec<u8>>;

    /// Read an environment variable.
    fn env(&self, key: &str) -> Option<String>;

    /// Begin watching a single file for changes. No-op / unsupported
    /// hosts may return `Ok(())` and simply never deliver events.
    async fn watch_file(&self, path: &Path) -> Result<()>;

    /// Sleep for the given duration — used by the watch controller's
    /// debounce timer, routed through the trait so an embedder can use a
    /// virtual clock in tests.
    async fn sleep(&self, duration: Duration);
}

/// Native implementation backed by `std::fs` (via `spawn_blocking`) and
/// `std::env`.
///
/// # Why async for synchronous calls
///
/// Native filesystem calls are blocking, but routing them through async
/// keeps the trait identical for a host that must bridge to genuinely
/// async I/O (network-backed virtual filesystems, browser storage, …).
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeSystem;

impl NativeSystem {
    /// Construct a native system interface.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SystemInterface for NativeSystem {
    async fn read_file(&self, path: &Path) -> Result<String> {
        let path = path.to_path_buf();
        let bytes = tokio::task::spawn_blocking({
            let path = path.clone();
            move || std::fs::read(&path)
        })
        .await
        .expect("read_file task panicked")
        .map_err(|source| BundleError::Io { path: path.clone(), source })?;
        String::from_utf8(bytes).map_err(|_| BundleError::Utf8(path))
    }

    async fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        let path = path.to_path_buf();
        let contents = contents.to_owned();
        tokio::task::spawn_blocking({
            let path = path.clone();
            move || {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&path, contents)
            }
        })
        .await
        .expect("write_file task panicked")
        .map_err(|source| BundleError::Io { path, source })
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<String>> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking({
            let path = path.clone();
            move || {
                let mut out = Vec::new();
                for entry in std::fs::read_dir(&path)? {
                    let entry = entry?;
                    if let Some(name) = entry.file_name().to_str() {
                        out.push(name.to_owned());
                    }
                }
                Ok(out)
            }
        })
        .await
        .expect("read_dir task panicked")
        .map_err(|source| BundleError::Io { path, source })
    }

    fn realpath(&self, path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| crate::path_util::normalize(path))
    }

    async fn mtime_ms(&self, path: &Path) -> Result<Option<u64>> {
        let path = path.to_path_buf();
        let metadata = tokio::task::spawn_blocking({
            let path = path.clone();
            move || std::fs::metadata(&path)
        })
        .await
        .expect("mtime task panicked")
        .map_err(|source| BundleError::Io { path, source })?;
        Ok(metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64))
    }

    fn base64_decode(&self, data: &str) -> Result<Vec<u8>> {
        base64_simd::STANDARD
            .decode_to_vec(data.as_bytes())
            .map_err(|e| BundleError::Io {
                path: PathBuf::new(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()),
            })
    }

    fn env(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    async fn watch_file(&self, _path: &Path) -> Result<()> {
        // Actual subscription lives in the CLI's watcher (crate::watch
        // only tracks state); the native system interface here is
        // responsible for I/O, not watch plumbing.
        Ok(())
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
