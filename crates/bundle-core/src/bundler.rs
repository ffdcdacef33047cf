//! Bundler core (§4.4–§4.5): the traversal loop that drains a pending
//! queue of references down to a closed module table, plus the per-asset
//! rewrite applied to every module along the way.

use crate::assembler;
use crate::catalog::AssetCatalog;
use crate::error::{BundleError, Result};
use crate::json_synth;
use crate::minifier::{MinifyOptions, Minifier};
use crate::module::Module;
use crate::path_util;
use crate::resolver::ModuleResolver;
use crate::scanner;
use crate::system::SystemInterface;
use crate::type_detector::{ModuleKind, TypeDetector};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Per-build options that aren't part of the (mostly static) asset
/// catalog.
#[derive(Debug, Clone)]
pub struct BundleOptions {
    /// Absolute path to the entrypoint module.
    pub entry: PathBuf,
    /// Whether to run the minifier over each module's final text.
    pub compress: bool,
    /// Whether to keep (and materialize) source maps at all. When false,
    /// any map recovered or produced during rewriting is dropped before
    /// assembly.
    pub sourcemaps: bool,
}

/// Drives resolution, scanning and assembly for one bundle.
pub struct Bundler<'a> {
    sys: &'a dyn SystemInterface,
    catalog: AssetCatalog,
    minifier: Option<&'a dyn Minifier>,
}

impl<'a> Bundler<'a> {
    /// Build a bundler over the given catalog, system interface, and
    /// optional minifier collaborator.
    pub fn new(sys: &'a dyn SystemInterface, catalog: AssetCatalog, minifier: Option<&'a dyn Minifier>) -> Self {
        Self { sys, catalog, minifier }
    }

    /// Build the bundle's full text form, starting from `options.entry`.
    pub async fn build(&self, options: &BundleOptions) -> Result<String> {
        let resolver = ModuleResolver::new(&self.catalog, self.sys);
        let esm_roots =
            vec![self.catalog.project_root.clone(), self.catalog.compiler_root.clone(), self.catalog.shim_dir.clone()];
        let detector = TypeDetector::new(self.sys, esm_roots);

        let entry_path = self.sys.realpath(&options.entry);

        let mut to_process: VecDeque<PathBuf> = VecDeque::from([entry_path.clone()]);
        let mut processed: HashMap<PathBuf, Module> = HashMap::new();
        let mut aliases: HashMap<PathBuf, Vec<String>> = HashMap::new();
        let mut missing: BTreeSet<String> = BTreeSet::new();
        let mut cjs_offenders: Vec<PathBuf> = Vec::new();

        while let Some(path) = to_process.pop_front() {
            if processed.contains_key(&path) {
                continue;
            }
            let kind = detector.detect(&path).await;
            let raw = match self.sys.read_file(&path).await {
                Ok(text) => text,
                Err(_) => {
                    missing.insert(path.display().to_string());
                    continue;
                }
            };

            let (rewritten, map) = if matches!(kind, ModuleKind::Json) {
                let synthesized = json_synth::synthesize(&raw, &path)?;
                self.rewrite(&path, synthesized, options).await?
            } else {
                if matches!(kind, ModuleKind::Cjs) {
                    warn!(path = %path.display(), "reachable CommonJS module");
                    cjs_offenders.push(path.clone());
                }
                let scanned = scanner::scan(&raw, &path, kind)?;
                for reference in scanned.references {
                    match resolver.resolve(&reference, &path).await {
                        Ok(resolution) => {
                            if resolution.needs_alias {
                                aliases.entry(resolution.path.clone()).or_default().push(reference);
                            }
                            to_process.push_back(resolution.path);
                        }
                        Err(unresolved) => {
                            missing.insert(unresolved);
                        }
                    }
                }
                self.rewrite(&path, raw, options).await?
            };

            processed.insert(path.clone(), {
                let mut module = Module::new(self.asset_name(&path), rewritten);
                module.map = map;
                module.is_entry = path == entry_path;
                module
            });
        }

        if !cjs_offenders.is_empty() {
            cjs_offenders.sort();
            cjs_offenders.dedup();
            return Err(BundleError::CommonJsDetected(cjs_offenders));
        }
        if !missing.is_empty() {
            return Err(BundleError::Unresolvable(missing.into_iter().collect()));
        }

        let mut modules: Vec<Module> = Vec::with_capacity(processed.len());
        for (path, mut module) in processed {
            if let Some(extra) = aliases.remove(&path) {
                module.aliases.extend(extra);
                module.aliases.sort();
                module.aliases.dedup();
            }
            modules.push(module);
        }

        debug!(module_count = modules.len(), "bundle closed");
        Ok(assembler::assemble(&modules))
    }

    /// Map a resolved native path to a POSIX asset name, rooted at
    /// whichever of the three known roots contains it. Project sources
    /// keep a bare `/...` name; compiler-emitted and shim assets get a
    /// disambiguating prefix so they can never collide with a
    /// project-rooted name.
    fn asset_name(&self, path: &Path) -> String {
        if let Some(name) = path_util::asset_name(&self.catalog.project_root, path) {
            return name;
        }
        if let Some(name) = path_util::asset_name(&self.catalog.compiler_root, path) {
            return format!("/.compiled{name}");
        }
        if let Some(name) = path_util::asset_name(&self.catalog.shim_dir, path) {
            return format!("/.shims{name}");
        }
        path_util::to_posix(path)
    }

    /// Per-asset rewrite: strip a leading `"use strict"` directive, pull
    /// out and materialize any source map, then (optionally) minify.
    async fn rewrite(&self, path: &Path, text: String, options: &BundleOptions) -> Result<(String, Option<String>)> {
        let text = strip_use_strict(&text);
        let (text, map_ref) = extract_source_mapping_comment(&text);
        let mut map = match map_ref {
            Some(value) => self.materialize_source_map(path, &value).await?,
            None => None,
        };

        let mut code = text;
        if options.compress {
            if let Some(minifier) = self.minifier {
                let filename = path.to_string_lossy().to_string();
                let minify_options = MinifyOptions { sourcemaps: options.sourcemaps };
                let output = minifier.minify(&filename, &code, map.as_deref(), &minify_options).await?;
                code = output.code;
                map = output.map;
            }
        }
        if !options.sourcemaps {
            map = None;
        }
        Ok((code, map))
    }

    async fn materialize_source_map(&self, path: &Path, value: &str) -> Result<Option<String>> {
        const DATA_URL_PREFIX: &str = "data:application/json;base64,";
        if let Some(b64) = value.strip_prefix(DATA_URL_PREFIX) {
            let bytes = self.sys.base64_decode(b64)?;
            let text = String::from_utf8(bytes).map_err(|_| BundleError::Utf8(path.to_path_buf()))?;
            return Ok(Some(text));
        }
        let sibling = path_util::dirname(path).join(value);
        if self.sys.exists(&sibling) {
            return Ok(Some(self.sys.read_file(&sibling).await?));
        }
        Ok(None)
    }
}

/// Strip a leading `"use strict";` or `'use strict';` directive, if the
/// source begins with one. Project output is already strict-mode ESM, so
/// this directive only ever appears as dead weight carried over from a
/// CJS-authored dependency's transpiled output.
fn strip_use_strict(text: &str) -> String {
    let trimmed = text.trim_start();
    for directive in ["\"use strict\";", "\"use strict\"", "'use strict';", "'use strict'"] {
        if let Some(rest) = trimmed.strip_prefix(directive) {
            return rest.trim_start_matches(['\n', '\r']).to_string();
        }
    }
    text.to_string()
}

/// Pull a trailing `//# sourceMappingURL=...` comment line out of `text`,
/// returning the remaining source and the comment's value (if any).
fn extract_source_mapping_comment(text: &str) -> (String, Option<String>) {
    const MARKER: &str = "//# sourceMappingURL=";
    let mut value = None;
    let mut kept = Vec::new();
    for line in text.lines() {
        if let Some(v) = line.trim_start().strip_prefix(MARKER) {
            value = Some(v.trim().to_string());
        } else {
            kept.push(line);
        }
    }
    (kept.join("\n"), value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::minifier::MinifyOutput;
    use crate::system::NativeSystem;
    use async_trait::async_trait;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        root: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        Fixture { _dir: dir, root }
    }

    fn catalog(root: &Path) -> AssetCatalog {
        AssetCatalog::new(root.join("shims"), "@frida", root, root.join(".compiled"), "frida-compile")
    }

    fn options(entry: PathBuf) -> BundleOptions {
        BundleOptions { entry, compress: false, sourcemaps: true }
    }

    #[tokio::test]
    async fn builds_bundle_with_relative_import() {
        let fx = fixture();
        fs::write(fx.root.join("index.js"), r#"import { greet } from "./greet.js"; greet();"#).unwrap();
        fs::write(fx.root.join("greet.js"), r#"export function greet() {}"#).unwrap();

        let sys = NativeSystem::new();
        let bundler = Bundler::new(&sys, catalog(&fx.root), None);
        let bundle = bundler.build(&options(fx.root.join("index.js"))).await.unwrap();

        assert!(bundle.starts_with("📦"));
        assert!(bundle.contains("/index.js"));
        assert!(bundle.contains("/greet.js"));
        let index_manifest_pos = bundle.find("/index.js").unwrap();
        let greet_manifest_pos = bundle.find("/greet.js").unwrap();
        assert!(index_manifest_pos < greet_manifest_pos);
    }

    #[tokio::test]
    async fn reports_unresolvable_reference() {
        let fx = fixture();
        fs::write(fx.root.join("index.js"), r#"import "./missing.js";"#).unwrap();

        let sys = NativeSystem::new();
        let bundler = Bundler::new(&sys, catalog(&fx.root), None);
        let err = bundler.build(&options(fx.root.join("index.js"))).await.unwrap_err();
        assert!(matches!(err, BundleError::Unresolvable(_)));
    }

    #[tokio::test]
    async fn rejects_reachable_commonjs_module() {
        let fx = fixture();
        fs::write(fx.root.join("index.js"), r#"import "left-pad";"#).unwrap();
        let pkg = fx.root.join("node_modules/left-pad");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("package.json"), r#"{"main": "index.js"}"#).unwrap();
        fs::write(pkg.join("index.js"), r#"module.exports = function () {};"#).unwrap();

        let sys = NativeSystem::new();
        let bundler = Bundler::new(&sys, catalog(&fx.root), None);
        let err = bundler.build(&options(fx.root.join("index.js"))).await.unwrap_err();
        assert!(matches!(err, BundleError::CommonJsDetected(_)));
    }

    #[tokio::test]
    async fn strips_use_strict_directive_from_payload() {
        let fx = fixture();
        fs::write(fx.root.join("index.js"), "\"use strict\";\nconsole.log('hi');").unwrap();

        let sys = NativeSystem::new();
        let bundler = Bundler::new(&sys, catalog(&fx.root), None);
        let bundle = bundler.build(&options(fx.root.join("index.js"))).await.unwrap();
        assert!(!bundle.contains("use strict"));
        assert!(bundle.contains("console.log"));
    }

    #[tokio::test]
    async fn synthesizes_json_imports() {
        let fx = fixture();
        fs::write(fx.root.join("index.js"), r#"import pkg from "./pkg.json";"#).unwrap();
        fs::write(fx.root.join("pkg.json"), r#"{"name": "agent"}"#).unwrap();

        let sys = NativeSystem::new();
        let bundler = Bundler::new(&sys, catalog(&fx.root), None);
        let bundle = bundler.build(&options(fx.root.join("index.js"))).await.unwrap();
        assert!(bundle.contains("export default"));
        assert!(bundle.contains("agent"));
    }

    #[tokio::test]
    async fn bare_builtin_shim_reference_is_recorded_as_alias() {
        let fx = fixture();
        fs::write(fx.root.join("index.js"), r#"import { Buffer } from "buffer";"#).unwrap();
        let shim = fx.root.join("shims/@frida/buffer");
        fs::create_dir_all(&shim).unwrap();
        fs::write(shim.join("index.js"), r#"export class Buffer {}"#).unwrap();

        let sys = NativeSystem::new();
        let bundler = Bundler::new(&sys, catalog(&fx.root), None);
        let bundle = bundler.build(&options(fx.root.join("index.js"))).await.unwrap();
        assert!(bundle.contains("↻ buffer"));
    }

    struct UppercaseMinifier;

    #[async_trait]
    impl Minifier for UppercaseMinifier {
        async fn minify(
            &self,
            _filename: &str,
            source: &str,
            _existing_map: Option<&str>,
            _options: &MinifyOptions,
        ) -> Result<MinifyOutput> {
            Ok(MinifyOutput { code: source.to_uppercase(), map: None })
        }
    }

    #[tokio::test]
    async fn compress_option_invokes_minifier() {
        let fx = fixture();
        fs::write(fx.root.join("index.js"), "const x = 1;").unwrap();

        let sys = NativeSystem::new();
        let minifier = UppercaseMinifier;
        let bundler = Bundler::new(&sys, catalog(&fx.root), Some(&minifier));
        let mut opts = options(fx.root.join("index.js"));
        opts.compress = true;
        let bundle = bundler.build(&opts).await.unwrap();
        assert!(bundle.contains("CONST X = 1;"));
    }
}
