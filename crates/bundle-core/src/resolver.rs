//! Module resolver (§4.1): maps a `(reference-string, referrer-path)` pair
//! to a concrete absolute file path, and decides whether the reference
//! needs recording as an alias on the resolved module.

use crate::catalog::AssetCatalog;
use crate::path_util;
use crate::system::SystemInterface;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Concrete, absolute, native path of the resolved asset.
    pub path: PathBuf,
    /// Whether the original reference string differs from the
    /// mechanically derivable asset name and must be recorded as an
    /// alias (§3).
    pub needs_alias: bool,
}

/// The subset of `package.json` the resolver reads.
#[derive(Debug, Default, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    module: Option<String>,
    #[serde(default)]
    main: Option<String>,
    #[serde(default)]
    exports: Option<serde_json::Value>,
}

impl PackageManifest {
    /// Extract the `.` export condition in preference order
    /// `import` > `require` > `default`, per SPEC_FULL's `exports`-map
    /// supplement. Returns `None` when absent or unparseable — `module`
    /// and `main` remain authoritative.
    fn exports_dot(&self) -> Option<&str> {
        let exports = self.exports.as_ref()?;
        let dot = match exports {
            serde_json::Value::String(s) => return Some(s.as_str()),
            serde_json::Value::Object(map) => map.get(".")?,
            _ => return None,
        };
        match dot {
            serde_json::Value::String(s) => Some(s.as_str()),
            serde_json::Value::Object(conditions) => {
                for key in ["import", "require", "default"] {
                    if let Some(s) = conditions.get(key).and_then(|v| v.as_str()) {
                        return Some(s);
                    }
                }
                None
            }
            _ => None,
        }
    }
}

/// Resolves module references against an [`AssetCatalog`] through a
/// [`SystemInterface`].
pub struct ModuleResolver<'a> {
    catalog: &'a AssetCatalog,
    sys: &'a dyn SystemInterface,
}

impl<'a> ModuleResolver<'a> {
    /// Build a resolver over the given catalog and system interface.
    pub fn new(catalog: &'a AssetCatalog, sys: &'a dyn SystemInterface) -> Self {
        Self { catalog, sys }
    }

    /// Resolve `name` as referenced from `referrer`. Returns the original
    /// reference string back as the error on failure, so callers can
    /// accumulate a sorted `missing` set (§4.4 step 3).
    pub async fn resolve(&self, name: &str, referrer: &Path) -> Result<Resolution, String> {
        let (mut current, mut needs_alias) = self.initial_candidate(name, referrer);

        // Step 5/6: directory handling.
        if self.sys.is_dir(&current) {
            let manifest_path = current.join("package.json");
            if self.sys.exists(&manifest_path) {
                let chosen = self.read_manifest_entry(&manifest_path).await;
                current = current.join(chosen.unwrap_or_else(|| "index.js".to_string()));
                if self.sys.is_dir(&current) {
                    current = current.join("index.js");
                }
                needs_alias = true;
            } else {
                current = current.join("index.js");
            }
        }

        // Step 7: missing-extension retry.
        if !self.is_resolvable_file(&current) {
            let with_ext = append_extension(&current, "js");
            if self.is_resolvable_file(&with_ext) {
                current = with_ext;
            } else {
                debug!(reference = name, referrer = %referrer.display(), "unresolvable reference");
                return Err(name.to_string());
            }
        }

        Ok(Resolution { path: current, needs_alias })
    }

    fn is_resolvable_file(&self, path: &Path) -> bool {
        self.sys.exists(path) && !self.sys.is_dir(path)
    }

    /// Steps 1-4: pick the starting candidate before directory/extension
    /// finalization.
    fn initial_candidate(&self, name: &str, referrer: &Path) -> (PathBuf, bool) {
        if Path::new(name).is_absolute() {
            return (PathBuf::from(name), false);
        }

        // Step 2: a relative reference is resolved against the referrer's
        // directory before any bare-specifier tokenization runs, so `.`
        // is never mistaken for a package name.
        if name.starts_with("./") || name.starts_with("../") || name == "." || name == ".." {
            let referrer_dir = path_util::dirname(referrer);
            return (path_util::join(&referrer_dir, name), false);
        }

        let (package_name, subpath) = tokenize(name);

        if let Some(shim_root) = self.catalog.shim_root(&package_name) {
            let candidate = if shim_root.extension().is_some_and(|e| e == "js") {
                shim_root.to_path_buf()
            } else if subpath.is_empty() {
                shim_root.to_path_buf()
            } else {
                shim_root.join(&subpath)
            };
            return (candidate, true);
        }

        let base = if self.catalog.is_toolchain_path(referrer) {
            self.catalog.shim_dir.clone()
        } else {
            self.catalog.project_node_modules()
        };
        let candidate = base.join(name);
        (candidate, !subpath.is_empty())
    }

    async fn read_manifest_entry(&self, manifest_path: &Path) -> Option<String> {
        let text = self.sys.read_file(manifest_path).await.ok()?;
        let manifest: PackageManifest = serde_json::from_str(&text).ok()?;
        manifest
            .exports_dot()
            .map(str::to_string)
            .or(manifest.module)
            .or(manifest.main)
    }
}

/// Split a bare reference into `(package_name, subpath)`. Scoped packages
/// (`@scope/name`) consume their first two segments as the package name.
fn tokenize(name: &str) -> (String, String) {
    let segments: Vec<&str> = name.split('/').collect();
    if segments.first().is_some_and(|s| s.starts_with('@')) && segments.len() >= 2 {
        let package_name = format!("{}/{}", segments[0], segments[1]);
        let subpath = segments[2..].join("/");
        (package_name, subpath)
    } else {
        let package_name = segments.first().copied().unwrap_or("").to_string();
        let subpath = segments.get(1..).map(|s| s.join("/")).unwrap_or_default();
        (package_name, subpath)
    }
}

fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::NativeSystem;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> (TempDir, AssetCatalog) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        let catalog =
            AssetCatalog::new(root.join("shims"), "@frida", &root, root.join(".compiled"), "frida-compile");
        (dir, catalog)
    }

    #[tokio::test]
    async fn resolves_relative_with_missing_extension() {
        let (dir, catalog) = project();
        fs::create_dir_all(dir.path().join("agent")).unwrap();
        fs::write(dir.path().join("agent/greet.js"), "").unwrap();
        let sys = NativeSystem::new();
        let resolver = ModuleResolver::new(&catalog, &sys);
        let referrer = dir.path().join("agent/index.js");
        let res = resolver.resolve("./greet", &referrer).await.unwrap();
        assert_eq!(res.path, dir.path().join("agent/greet.js"));
        assert!(!res.needs_alias);
    }

    #[tokio::test]
    async fn resolves_directory_to_index() {
        let (dir, catalog) = project();
        fs::create_dir_all(dir.path().join("agent/lib")).unwrap();
        fs::write(dir.path().join("agent/lib/index.js"), "").unwrap();
        let sys = NativeSystem::new();
        let resolver = ModuleResolver::new(&catalog, &sys);
        let referrer = dir.path().join("agent/index.js");
        let res = resolver.resolve("./lib", &referrer).await.unwrap();
        assert_eq!(res.path, dir.path().join("agent/lib/index.js"));
    }

    #[tokio::test]
    async fn resolves_shim_for_builtin() {
        let (dir, catalog) = project();
        fs::create_dir_all(dir.path().join("shims/@frida/buffer")).unwrap();
        fs::write(dir.path().join("shims/@frida/buffer/index.js"), "").unwrap();
        let sys = NativeSystem::new();
        let resolver = ModuleResolver::new(&catalog, &sys);
        let referrer = dir.path().join("agent/index.js");
        let res = resolver.resolve("buffer", &referrer).await.unwrap();
        assert_eq!(res.path, dir.path().join("shims/@frida/buffer/index.js"));
        assert!(res.needs_alias);
    }

    #[tokio::test]
    async fn resolves_node_prefixed_builtin() {
        let (dir, catalog) = project();
        fs::create_dir_all(dir.path().join("shims/@frida/buffer")).unwrap();
        fs::write(dir.path().join("shims/@frida/buffer/index.js"), "").unwrap();
        let sys = NativeSystem::new();
        let resolver = ModuleResolver::new(&catalog, &sys);
        let referrer = dir.path().join("agent/index.js");
        let res = resolver.resolve("node:buffer", &referrer).await.unwrap();
        assert_eq!(res.path, dir.path().join("shims/@frida/buffer/index.js"));
    }

    #[tokio::test]
    async fn resolves_project_node_modules_package_via_module_field() {
        let (dir, catalog) = project();
        let pkg = dir.path().join("node_modules/left-pad");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("package.json"), r#"{"module": "esm/index.js", "main": "index.js"}"#).unwrap();
        fs::create_dir_all(pkg.join("esm")).unwrap();
        fs::write(pkg.join("esm/index.js"), "").unwrap();
        let sys = NativeSystem::new();
        let resolver = ModuleResolver::new(&catalog, &sys);
        let referrer = dir.path().join("agent/index.js");
        let res = resolver.resolve("left-pad", &referrer).await.unwrap();
        assert_eq!(res.path, pkg.join("esm/index.js"));
        assert!(res.needs_alias);
    }

    #[tokio::test]
    async fn fails_unresolvable() {
        let (dir, catalog) = project();
        let sys = NativeSystem::new();
        let resolver = ModuleResolver::new(&catalog, &sys);
        let referrer = dir.path().join("agent/index.js");
        let err = resolver.resolve("./missing", &referrer).await.unwrap_err();
        assert_eq!(err, "./missing");
    }

    #[tokio::test]
    async fn scoped_package_subpath_needs_alias() {
        let (dir, catalog) = project();
        let pkg = dir.path().join("node_modules/@scope/pkg");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("feature.js"), "").unwrap();
        let sys = NativeSystem::new();
        let resolver = ModuleResolver::new(&catalog, &sys);
        let referrer = dir.path().join("agent/index.js");
        let res = resolver.resolve("@scope/pkg/feature", &referrer).await.unwrap();
        assert_eq!(res.path, pkg.join("feature.js"));
        assert!(res.needs_alias);
    }
}
