//! Portable path utility.
//!
//! Every key used inside the module table, asset table and manifest is a
//! POSIX-form path (forward slashes, leading `/`). This module is the only
//! place that converts between a native [`Path`] and that canonical form.

use path_clean::PathClean;
use std::path::{Path, PathBuf};

/// Normalize a native path: resolve `.`/`..` segments without touching the
/// filesystem (no symlink resolution — that's the system interface's job).
pub fn normalize(path: &Path) -> PathBuf {
    path.to_path_buf().clean()
}

/// Join a base path with a relative specifier and normalize the result.
pub fn join(base: &Path, rel: &str) -> PathBuf {
    normalize(&base.join(rel))
}

/// Parent directory, falling back to the path itself if it has none (e.g.
/// root).
pub fn dirname(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_else(|| path.to_path_buf())
}

/// Convert a native absolute path into POSIX form rooted at `/`.
///
/// On Unix this is a no-op besides UTF-8 validation; kept as a named
/// function so a Windows system interface can replace backslashes without
/// touching call sites.
pub fn to_posix(path: &Path) -> String {
    let s = path.to_string_lossy();
    let replaced = s.replace('\\', "/");
    if replaced.starts_with('/') {
        replaced
    } else {
        format!("/{replaced}")
    }
}

/// Convert a POSIX-form asset name back into a native path rooted at `root`.
pub fn from_posix(root: &Path, posix: &str) -> PathBuf {
    let trimmed = posix.trim_start_matches('/');
    normalize(&root.join(trimmed))
}

/// Derive an asset name by stripping `root` from an absolute file path and
/// re-rooting the remainder at `/`.
///
/// Returns `None` if `path` does not lie under `root`.
pub fn asset_name(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root).ok().map(|rel| {
        let posix = rel.to_string_lossy().replace('\\', "/");
        format!("/{posix}")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_dotdot() {
        let p = Path::new("/a/b/../c/./d");
        assert_eq!(normalize(p), PathBuf::from("/a/c/d"));
    }

    #[test]
    fn join_resolves_relative_specifier() {
        let base = Path::new("/project/src");
        assert_eq!(join(base, "../lib/x.js"), PathBuf::from("/project/lib/x.js"));
    }

    #[test]
    fn to_posix_prefixes_leading_slash() {
        assert_eq!(to_posix(Path::new("agent/index.js")), "/agent/index.js");
        assert_eq!(to_posix(Path::new("/agent/index.js")), "/agent/index.js");
    }

    #[test]
    fn asset_name_strips_root_prefix() {
        let root = Path::new("/project");
        let file = Path::new("/project/agent/greet.js");
        assert_eq!(asset_name(root, file).as_deref(), Some("/agent/greet.js"));
    }

    #[test]
    fn asset_name_none_when_outside_root() {
        let root = Path::new("/project");
        let file = Path::new("/elsewhere/greet.js");
        assert_eq!(asset_name(root, file), None);
    }

    #[test]
    fn from_posix_roundtrips_asset_name() {
        let root = Path::new("/project");
        let name = asset_name(root, Path::new("/project/a/b.js")).unwrap();
        assert_eq!(from_posix(root, &name), PathBuf::from("/project/a/b.js"));
    }
}
