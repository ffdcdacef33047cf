//! Default [`FrontEnd`] implementation: a transform-only compiler built
//! on `oxc_transformer`. It strips TypeScript syntax and lowers modern
//! syntax to `options.target`, but performs no type checking — there is
//! no bundled type checker here by design. A project that needs real
//! diagnostics plugs in its own [`FrontEnd`] instead.

use async_trait::async_trait;
use bundle_core::error::Result;
use bundle_core::frontend::{AfterTransform, CompilerOptions, Diagnostic, FrontEnd, Severity, WriteHook};
use bundle_core::system::SystemInterface;
use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_transformer::{TransformOptions, Transformer};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recognized project source extensions.
const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "mts"];

/// Walks `options.root_dir`, transforms every recognized source file, and
/// routes the result through the caller's write hook.
pub struct OxcFrontEnd {
    sys: Arc<dyn SystemInterface>,
}

impl OxcFrontEnd {
    /// Build a front end backed by `sys` for file discovery and reads.
    pub fn new(sys: Arc<dyn SystemInterface>) -> Self {
        Self { sys }
    }

    fn collect_sources<'a>(
        &'a self,
        dir: &'a Path,
        out: &'a mut Vec<PathBuf>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            for name in self.sys.read_dir(dir).await? {
                if name == "node_modules" {
                    continue;
                }
                let path = dir.join(&name);
                if self.sys.is_dir(&path) {
                    self.collect_sources(&path, out).await?;
                } else if path.extension().and_then(|e| e.to_str()).is_some_and(|e| SOURCE_EXTENSIONS.contains(&e)) {
                    out.push(path);
                }
            }
            Ok(())
        })
    }
}

#[async_trait]
impl FrontEnd for OxcFrontEnd {
    async fn emit(
        &self,
        options: &CompilerOptions,
        after_transformers: &[Box<AfterTransform<'_>>],
        write_file: &WriteHook<'_>,
    ) -> Result<Vec<Diagnostic>> {
        let mut sources = Vec::new();
        self.collect_sources(&options.root_dir, &mut sources).await?;

        let mut diagnostics = Vec::new();
        for path in sources {
            let text = self.sys.read_file(&path).await?;
            let allocator = Allocator::default();
            let source_type = SourceType::from_path(&path).unwrap_or_default();
            let parsed = Parser::new(&allocator, &text, source_type).parse();

            if !parsed.errors.is_empty() {
                diagnostics.extend(parsed.errors.iter().map(|e| Diagnostic {
                    message: e.to_string(),
                    file: Some(path.clone()),
                    line: None,
                    severity: Severity::Error,
                }));
                continue;
            }

            let mut program = parsed.program;
            let semantic = SemanticBuilder::new().build(&program).semantic;
            let transform_options = TransformOptions::default();
            if let Err(errors) =
                Transformer::new(&allocator, &path, &transform_options).build_with_semantic(semantic, &mut program)
            {
                diagnostics.extend(errors.iter().map(|e| Diagnostic {
                    message: e.to_string(),
                    file: Some(path.clone()),
                    line: None,
                    severity: Severity::Error,
                }));
                continue;
            }

            let mut code = Codegen::new().build(&program).code;
            let rel = path.strip_prefix(&options.root_dir).unwrap_or(&path);
            let out_path = options.out_dir.join(rel).with_extension("js");
            for transform in after_transformers {
                code = transform(&out_path, code);
            }
            write_file(&out_path, &code)?;
        }
        Ok(diagnostics)
    }

    async fn watch(
        &self,
        options: &CompilerOptions,
        after_program_create: &(dyn Fn(&[Diagnostic]) + Send + Sync),
    ) -> Result<()> {
        // No incremental program is retained between passes; each call
        // simply replays a full `emit`, which is enough for a front end
        // with no real type-checker state to carry forward.
        let diagnostics = self.emit(options, &[], &|_, _| Ok(())).await?;
        after_program_create(&diagnostics);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_core::system::NativeSystem;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[tokio::test]
    async fn emits_transformed_output_through_write_hook() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("src");
        let out = dir.path().join("out");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("index.ts"), "const x: number = 1;\nexport { x };").unwrap();

        let sys: Arc<dyn SystemInterface> = Arc::new(NativeSystem::new());
        let front_end = OxcFrontEnd::new(sys);
        let options = CompilerOptions::baseline(&root, &out);

        let written = Mutex::new(Vec::new());
        let write_file = |path: &Path, code: &str| -> Result<()> {
            written.lock().unwrap().push((path.to_path_buf(), code.to_string()));
            Ok(())
        };

        let diagnostics = front_end.emit(&options, &[], &write_file).await.unwrap();
        assert!(diagnostics.is_empty());
        let written = written.into_inner().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].0, out.join("index.js"));
        assert!(!written[0].1.contains(": number"));
    }

    #[tokio::test]
    async fn parse_errors_become_diagnostics() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("src");
        let out = dir.path().join("out");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("index.ts"), "const = ;;;").unwrap();

        let sys: Arc<dyn SystemInterface> = Arc::new(NativeSystem::new());
        let front_end = OxcFrontEnd::new(sys);
        let options = CompilerOptions::baseline(&root, &out);
        let write_file = |_: &Path, _: &str| -> Result<()> { Ok(()) };

        let diagnostics = front_end.emit(&options, &[], &write_file).await.unwrap();
        assert!(!diagnostics.is_empty());
        assert!(matches!(diagnostics[0].severity, Severity::Error));
    }
}
