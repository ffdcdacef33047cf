//! Default [`Minifier`] implementation, built on `oxc_minifier` and
//! `oxc_codegen`.

use bundle_core::error::{BundleError, Result};
use bundle_core::minifier::{MinifyOptions, MinifyOutput, Minifier};
use async_trait::async_trait;
use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_minifier::{Minifier as OxcMinifierEngine, MinifierOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;
use std::path::Path;

/// Minifies one file's JS text at a time through the oxc minifier
/// pipeline: parse, run oxc's mangle/compress passes, then print.
#[derive(Debug, Default, Clone, Copy)]
pub struct OxcMinifier;

impl OxcMinifier {
    /// Construct the default minifier.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Minifier for OxcMinifier {
    async fn minify(
        &self,
        filename: &str,
        source: &str,
        existing_map: Option<&str>,
        options: &MinifyOptions,
    ) -> Result<MinifyOutput> {
        let allocator = Allocator::default();
        let source_type = SourceType::from_path(Path::new(filename)).unwrap_or_default();
        let parsed = Parser::new(&allocator, source, source_type).parse();
        if !parsed.errors.is_empty() {
            return Err(BundleError::Minifier(format!(
                "{} parse error(s) in {filename}",
                parsed.errors.len()
            )));
        }

        let mut program = parsed.program;
        OxcMinifierEngine::new(MinifierOptions::default()).build(&allocator, &mut program);

        let codegen_options =
            CodegenOptions { minify: true, source_map_path: options.sourcemaps.then(|| Path::new(filename).to_path_buf()), ..Default::default() };
        let codegen_result = Codegen::new().with_options(codegen_options).build(&program);

        // TODO: merge `existing_map` (the pre-minification map) with the
        // map oxc's codegen produces here, so mapped positions still
        // point back to the module's original author rather than the
        // bundler's rewritten intermediate text.
        let _ = existing_map;

        let map = if options.sourcemaps {
            codegen_result.map.map(|m| m.to_json_string())
        } else {
            None
        };

        Ok(MinifyOutput { code: codegen_result.code, map })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn minifies_simple_source() {
        let minifier = OxcMinifier::new();
        let options = MinifyOptions { sourcemaps: false };
        let output = minifier.minify("index.js", "const value = 1 + 1;\n", None, &options).await.unwrap();
        assert!(!output.code.contains('\n'));
        assert!(output.map.is_none());
    }

    #[tokio::test]
    async fn requests_a_source_map_when_asked() {
        let minifier = OxcMinifier::new();
        let options = MinifyOptions { sourcemaps: true };
        let output = minifier.minify("index.js", "const value = 1;\n", None, &options).await.unwrap();
        assert!(output.map.is_some());
    }

    #[tokio::test]
    async fn parse_error_becomes_minifier_error() {
        let minifier = OxcMinifier::new();
        let options = MinifyOptions::default();
        let err = minifier.minify("index.js", "const = ;;;", None, &options).await.unwrap_err();
        assert!(matches!(err, BundleError::Minifier(_)));
    }
}
