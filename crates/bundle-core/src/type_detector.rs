//! Module-type detection (§4.2): classifies a resolved asset as ESM, CJS
//! or JSON before the scanner decides how to extract its references.

use crate::system::SystemInterface;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// The three module shapes the scanner needs to distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    /// ECMAScript module: `import`/`export` statements.
    Esm,
    /// CommonJS module: `require`/`module.exports`.
    Cjs,
    /// A `.json` file, routed to the JSON synthesizer instead of the
    /// scanner.
    Json,
}

/// Walks the directory tree upward from a file looking for the nearest
/// `package.json`, to classify that file's module kind.
pub struct TypeDetector<'a> {
    sys: &'a dyn SystemInterface,
    /// Roots whose contents are ESM by fiat (§4.2): the project's own
    /// sources (compiler front end only ever emits ESM), the compiler's
    /// own output directory, and the shim catalog (the toolchain authors
    /// its own shims as ESM). Nothing under `node_modules` qualifies even
    /// if it happens to sit under one of these roots.
    esm_roots: Vec<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    r#type: Option<String>,
    #[serde(default)]
    module: Option<String>,
}

impl<'a> TypeDetector<'a> {
    /// Build a detector that treats `esm_roots` as ESM by fiat.
    pub fn new(sys: &'a dyn SystemInterface, esm_roots: Vec<PathBuf>) -> Self {
        Self { sys, esm_roots }
    }

    /// Classify `path`.
    pub async fn detect(&self, path: &Path) -> ModuleKind {
        if path.extension().is_some_and(|e| e == "json") {
            return ModuleKind::Json;
        }
        if !self.under_node_modules(path) && self.esm_roots.iter().any(|root| path.starts_with(root)) {
            return ModuleKind::Esm;
        }
        self.detect_from_nearest_manifest(path).await
    }

    fn under_node_modules(&self, path: &Path) -> bool {
        path.components().any(|c| c.as_os_str() == "node_modules")
    }

    async fn detect_from_nearest_manifest(&self, path: &Path) -> ModuleKind {
        let mut dir = crate::path_util::dirname(path);
        loop {
            let manifest_path = dir.join("package.json");
            if self.sys.exists(&manifest_path) {
                if let Ok(text) = self.sys.read_file(&manifest_path).await {
                    if let Ok(manifest) = serde_json::from_str::<PackageManifest>(&text) {
                        // esm if either `type` is `"module"` or a `module`
                        // field is present at all — the resolver's own
                        // `module`/`main` preference treats such packages
                        // as ESM, so classification has to agree with it.
                        return if manifest.r#type.as_deref() == Some("module") || manifest.module.is_some() {
                            ModuleKind::Esm
                        } else {
                            ModuleKind::Cjs
                        };
                    }
                }
                return ModuleKind::Cjs;
            }
            let parent = dir.parent();
            match parent {
                Some(p) if p != dir => dir = p.to_path_buf(),
                _ => return ModuleKind::Cjs,
            }
        }
    }
}
