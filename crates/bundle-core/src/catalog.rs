//! Asset catalog: the resolved mapping from a small set of bare specifier
//! names to on-disk shim package roots, plus the project and compiler
//! `node_modules` roots (§2 item 3).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Node.js built-in module names the bundler ships shims for.
///
/// Matches the handful of builtins a user script realistically imports
/// inside an instrumentation runtime: no full Node compat layer, just the
/// modules frequently pulled in transitively by npm packages.
pub const SHIMMED_BUILTINS: &[&str] = &[
    "assert", "buffer", "events", "fs", "path", "process", "stream", "string_decoder", "util",
];

/// Resolved roots the module resolver consults.
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    /// Root directory holding one subdirectory per shim package, e.g.
    /// `<shim_dir>/@frida/buffer`.
    pub shim_dir: PathBuf,
    /// The project root (where the entrypoint and its `node_modules`
    /// live).
    pub project_root: PathBuf,
    /// Root the compiler front end emits into (`outDir`). Project source
    /// asset names are rooted here.
    pub compiler_root: PathBuf,
    /// Name of the compiler package itself, used to detect referrers that
    /// live inside `<project>/node_modules/<compiler_name>` (§4.1 step 4).
    pub compiler_name: String,
    scopes: HashMap<String, PathBuf>,
}

impl AssetCatalog {
    /// Build a catalog from explicit roots. `shim_namespace` is the
    /// package-name prefix shims are published under, e.g. `@frida` so
    /// that `buffer` maps to `<shim_dir>/@frida/buffer`.
    pub fn new(
        shim_dir: impl Into<PathBuf>,
        shim_namespace: &str,
        project_root: impl Into<PathBuf>,
        compiler_root: impl Into<PathBuf>,
        compiler_name: impl Into<String>,
    ) -> Self {
        let shim_dir = shim_dir.into();
        let mut scopes = HashMap::new();
        for name in SHIMMED_BUILTINS {
            scopes.insert((*name).to_string(), shim_dir.join(format!("{shim_namespace}/{name}")));
        }
        Self {
            shim_dir,
            project_root: project_root.into(),
            compiler_root: compiler_root.into(),
            compiler_name: compiler_name.into(),
            scopes,
        }
    }

    /// Look up a package name in the shim catalog. Strips a leading
    /// `node:` prefix first, per §8 S2 (both spellings then become
    /// aliases of the same module).
    pub fn shim_root(&self, package_name: &str) -> Option<&Path> {
        let stripped = package_name.strip_prefix("node:").unwrap_or(package_name);
        self.scopes.get(stripped).map(PathBuf::as_path)
    }

    /// `<project>/node_modules`.
    pub fn project_node_modules(&self) -> PathBuf {
        self.project_root.join("node_modules")
    }

    /// `<project>/node_modules/<compiler_name>`, the other base the
    /// resolver treats as "inside the toolchain" (§4.1 step 4).
    pub fn compiler_package_root(&self) -> PathBuf {
        self.project_node_modules().join(&self.compiler_name)
    }

    /// Whether `path` lies inside the shim dir or the compiler's own
    /// `node_modules` entry.
    ///
    /// Deliberately excludes `compiler_root`: once the front end is
    /// wired in, every project source lives under `compiler_root`, and
    /// treating all of those referrers as "toolchain" would route
    /// ordinary bare-specifier resolution (§4.1 step 4) at `shim_dir`
    /// instead of the project's own `node_modules`, breaking resolution
    /// of real npm dependencies imported from compiled project code.
    pub fn is_toolchain_path(&self, path: &Path) -> bool {
        path.starts_with(&self.shim_dir) || path.starts_with(self.compiler_package_root())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> AssetCatalog {
        AssetCatalog::new("/shims", "@frida", "/project", "/project/.compiled", "frida-compile")
    }

    #[test]
    fn shim_root_resolves_known_builtin() {
        let cat = catalog();
        assert_eq!(cat.shim_root("buffer"), Some(Path::new("/shims/@frida/buffer")));
    }

    #[test]
    fn shim_root_strips_node_prefix() {
        let cat = catalog();
        assert_eq!(cat.shim_root("node:buffer"), Some(Path::new("/shims/@frida/buffer")));
    }

    #[test]
    fn shim_root_none_for_unknown() {
        let cat = catalog();
        assert_eq!(cat.shim_root("lodash"), None);
    }

    #[test]
    fn toolchain_path_detection() {
        let cat = catalog();
        assert!(cat.is_toolchain_path(Path::new("/shims/@frida/buffer/index.js")));
        assert!(cat.is_toolchain_path(Path::new("/project/node_modules/frida-compile/lib.js")));
        assert!(!cat.is_toolchain_path(Path::new("/project/node_modules/lodash/index.js")));
        assert!(!cat.is_toolchain_path(Path::new("/project/.compiled/agent/index.js")));
    }
}
