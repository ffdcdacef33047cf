//! Module scanner (§4.3): parses a source file once and extracts the
//! reference strings the bundler core must resolve — static
//! `import`/`export … from` specifiers for ESM, and `require(...)` call
//! sites (including nested ones) for CJS.

use crate::error::{BundleError, Result};
use crate::type_detector::ModuleKind;
use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Argument, CallExpression, Expression, ExportAllDeclaration, ExportNamedDeclaration,
    ImportDeclaration, ImportExpression,
};
use oxc_ast_visit::{walk, Visit};
use oxc_parser::Parser;
use oxc_span::SourceType;
use std::path::Path;

/// Reference strings pulled out of one source file, in source order
/// (duplicates preserved — the bundler core dedupes while draining the
/// pending queue).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// Every reference string the source directly names.
    pub references: Vec<String>,
}

/// Parse `source` (already read through the system interface) and collect
/// its references according to `kind`.
pub fn scan(source: &str, path: &Path, kind: ModuleKind) -> Result<ScanResult> {
    let allocator = Allocator::default();
    let source_type = SourceType::from_path(path).unwrap_or_default();
    let parsed = Parser::new(&allocator, source, source_type).parse();
    if !parsed.errors.is_empty() {
        return Err(BundleError::CompilationFailed(parsed.errors.len()));
    }

    let mut collector = ReferenceCollector { references: Vec::new(), kind };
    collector.visit_program(&parsed.program);
    Ok(ScanResult { references: collector.references })
}

struct ReferenceCollector {
    references: Vec<String>,
    kind: ModuleKind,
}

impl ReferenceCollector {
    fn is_require_call<'a>(expr: &CallExpression<'a>) -> bool {
        expr.callee.get_identifier_reference().is_some_and(|ident| ident.name == "require")
    }

    fn string_argument<'a>(expr: &CallExpression<'a>) -> Option<String> {
        match expr.arguments.first()? {
            Argument::StringLiteral(lit) => Some(lit.value.to_string()),
            _ => None,
        }
    }
}

impl<'a> Visit<'a> for ReferenceCollector {
    fn visit_import_declaration(&mut self, decl: &ImportDeclaration<'a>) {
        if matches!(self.kind, ModuleKind::Esm) {
            self.references.push(decl.source.value.to_string());
        }
        walk::walk_import_declaration(self, decl);
    }

    fn visit_export_named_declaration(&mut self, decl: &ExportNamedDeclaration<'a>) {
        if matches!(self.kind, ModuleKind::Esm) {
            if let Some(source) = &decl.source {
                self.references.push(source.value.to_string());
            }
        }
        walk::walk_export_named_declaration(self, decl);
    }

    fn visit_export_all_declaration(&mut self, decl: &ExportAllDeclaration<'a>) {
        if matches!(self.kind, ModuleKind::Esm) {
            self.references.push(decl.source.value.to_string());
        }
        walk::walk_export_all_declaration(self, decl);
    }

    fn visit_import_expression(&mut self, expr: &ImportExpression<'a>) {
        if matches!(self.kind, ModuleKind::Esm) {
            if let Expression::StringLiteral(lit) = &expr.source {
                self.references.push(lit.value.to_string());
            }
        }
        walk::walk_import_expression(self, expr);
    }

    fn visit_call_expression(&mut self, expr: &CallExpression<'a>) {
        if matches!(self.kind, ModuleKind::Cjs) && Self::is_require_call(expr) {
            if let Some(specifier) = Self::string_argument(expr) {
                self.references.push(specifier);
            }
        }
        // Nested require() calls (e.g. inside a ternary, an IIFE argument,
        // or another call's arguments) are still reachable via the normal
        // walk, so no separate recursion is needed here.
        walk::walk_call_expression(self, expr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn path(name: &str) -> PathBuf {
        PathBuf::from(name)
    }

    #[test]
    fn collects_static_esm_imports_and_exports() {
        let source = r#"
            import greet from "./greet.js";
            export { helper } from "./helper.js";
            export * from "./reexport.js";
        "#;
        let result = scan(source, &path("index.js"), ModuleKind::Esm).unwrap();
        assert_eq!(
            result.references,
            vec!["./greet.js".to_string(), "./helper.js".to_string(), "./reexport.js".to_string()]
        );
    }

    #[test]
    fn collects_dynamic_import_in_esm() {
        let source = r#"const mod = await import("./lazy.js");"#;
        let result = scan(source, &path("index.js"), ModuleKind::Esm).unwrap();
        assert_eq!(result.references, vec!["./lazy.js".to_string()]);
    }

    #[test]
    fn collects_require_calls_in_cjs() {
        let source = r#"
            const a = require("a-package");
            const b = require("./local");
        "#;
        let result = scan(source, &path("index.js"), ModuleKind::Cjs).unwrap();
        assert_eq!(result.references, vec!["a-package".to_string(), "./local".to_string()]);
    }

    #[test]
    fn collects_nested_require_calls_in_cjs() {
        let source = r#"
            const a = condition ? require("left") : require("right");
            doSomething(require("inner"));
        "#;
        let result = scan(source, &path("index.js"), ModuleKind::Cjs).unwrap();
        assert_eq!(
            result.references,
            vec!["left".to_string(), "right".to_string(), "inner".to_string()]
        );
    }

    #[test]
    fn ignores_imports_when_classified_as_cjs() {
        let source = r#"import x from "./ignored.js";"#;
        let result = scan(source, &path("index.js"), ModuleKind::Cjs).unwrap();
        assert!(result.references.is_empty());
    }

    #[test]
    fn parse_error_becomes_compilation_failed() {
        let source = "import from;;;";
        let err = scan(source, &path("index.js"), ModuleKind::Esm).unwrap_err();
        assert!(matches!(err, BundleError::CompilationFailed(_)));
    }
}
