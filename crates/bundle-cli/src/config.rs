//! Project root discovery and the `tsconfig.json` soft-option overlay
//! (SPEC_FULL supplement).

use bundle_core::frontend::CompilerOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Roots derived from the entrypoint's location.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// Project root: the nearest ancestor of the entrypoint containing a
    /// `package.json`, or the entrypoint's own directory if none is
    /// found.
    pub project_root: PathBuf,
    /// Directory the front end emits compiled project sources into.
    pub compiler_root: PathBuf,
}

impl ProjectConfig {
    /// Walk upward from `entry`'s directory looking for the nearest
    /// `package.json`.
    pub fn discover(entry: &Path) -> Self {
        let start = entry.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
        let mut dir = start.clone();
        let project_root = loop {
            if dir.join("package.json").is_file() {
                break dir;
            }
            match dir.parent() {
                Some(parent) if parent != dir => dir = parent.to_path_buf(),
                _ => break start,
            }
        };
        let compiler_root = project_root.join(".compiled");
        Self { project_root, compiler_root }
    }
}

#[derive(Debug, Default, Deserialize)]
struct TsconfigCompilerOptions {
    target: Option<String>,
    lib: Option<Vec<String>>,
    strict: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct Tsconfig {
    #[serde(rename = "compilerOptions", default)]
    compiler_options: TsconfigCompilerOptions,
}

/// Overlay a project-local `tsconfig.json`'s soft options
/// (`target`/`lib`/`strict`) onto `baseline`. The hard options
/// (`module`, `moduleResolution`, `rootDir`, `outDir`, `sourceMap`,
/// `inlineSourceMap`, `noEmit`) this pipeline depends on structurally are
/// never overridable, so a malformed or adversarial `tsconfig.json` can't
/// break the bundler's invariants — at worst it's ignored.
pub fn apply_tsconfig_overlay(mut baseline: CompilerOptions, tsconfig_text: Option<&str>) -> CompilerOptions {
    let Some(text) = tsconfig_text else {
        return baseline;
    };
    let Ok(tsconfig) = serde_json::from_str::<Tsconfig>(text) else {
        return baseline;
    };
    if let Some(target) = tsconfig.compiler_options.target {
        baseline.target = target;
    }
    if let Some(lib) = tsconfig.compiler_options.lib {
        baseline.lib = lib;
    }
    if let Some(strict) = tsconfig.compiler_options.strict {
        baseline.strict = strict;
    }
    baseline
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn discovers_nearest_package_json() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), "{}").unwrap();
        fs::create_dir_all(dir.path().join("agent")).unwrap();
        let entry = dir.path().join("agent/index.js");
        let config = ProjectConfig::discover(&entry);
        assert_eq!(config.project_root, dir.path());
    }

    #[test]
    fn falls_back_to_entry_directory_when_no_manifest_found() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("agent")).unwrap();
        let entry = dir.path().join("agent/index.js");
        let config = ProjectConfig::discover(&entry);
        assert_eq!(config.project_root, dir.path().join("agent"));
    }

    #[test]
    fn overlay_only_touches_soft_options() {
        let baseline = CompilerOptions::baseline("/project", "/project/.compiled");
        let tsconfig = r#"{"compilerOptions": {"target": "es2022", "strict": false}}"#;
        let overlaid = apply_tsconfig_overlay(baseline, Some(tsconfig));
        assert_eq!(overlaid.target, "es2022");
        assert!(!overlaid.strict);
        assert_eq!(overlaid.module, "esnext");
        assert!(overlaid.no_emit);
    }

    #[test]
    fn missing_tsconfig_keeps_baseline() {
        let baseline = CompilerOptions::baseline("/project", "/project/.compiled");
        let overlaid = apply_tsconfig_overlay(baseline.clone(), None);
        assert_eq!(overlaid.target, baseline.target);
    }
}
