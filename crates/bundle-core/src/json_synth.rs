//! JSON-to-module synthesizer (§4.6): turns a parsed JSON asset into the
//! text of a small ES module so the rest of the pipeline can treat it like
//! any other module.
//!
//! The synthesized module exports the JSON value as `default`, plus a
//! named export per top-level object key that happens to be a valid,
//! non-reserved JS identifier — so `import { version } from "./pkg.json"`
//! works without the importer needing to destructure the default export.
//!
//! The default binding's right-hand side is the source JSON text itself,
//! trimmed of leading/trailing whitespace only — key order and number
//! formatting are never touched by a parse/re-serialize round trip. The
//! parsed `Value` exists solely to decide which keys qualify as named
//! exports and to report invalid JSON.

use crate::error::{BundleError, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

const RESERVED_WORDS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "enum", "export", "extends", "false", "finally", "for", "function", "if", "import",
    "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw", "true", "try",
    "typeof", "var", "void", "while", "with", "let", "static", "yield", "await",
];

/// Synthesize an ES module's source text from a JSON asset's raw contents.
pub fn synthesize(json_text: &str, path: &Path) -> Result<String> {
    let value: Value = serde_json::from_str(json_text)
        .map_err(|source| BundleError::Json { path: path.to_path_buf(), source })?;

    let named_keys: Vec<&str> = match &value {
        Value::Object(map) => map.keys().map(String::as_str).filter(|k| is_valid_export_name(k)).collect(),
        _ => Vec::new(),
    };

    let used: HashSet<&str> = named_keys.iter().copied().collect();
    let default_name = pick_default_name(&used);

    let mut module = String::new();
    module.push_str(&format!("const {default_name} = {};\n", json_text.trim()));
    for key in &named_keys {
        module.push_str(&format!("export const {key} = {default_name}.{key};\n"));
    }
    module.push_str(&format!("export default {default_name};\n"));
    Ok(module)
}

/// A top-level key becomes a named export only if it's a valid JS
/// identifier and not a reserved word — anything else (numeric keys,
/// hyphenated keys, `"default"`) stays reachable only through the default
/// export.
fn is_valid_export_name(name: &str) -> bool {
    if name.is_empty() || RESERVED_WORDS.contains(&name) {
        return false;
    }
    let mut chars = name.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$');
    first_ok && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Shortest unused identifier of the form `d`, `d1`, `d2`, … that doesn't
/// collide with a named export.
fn pick_default_name(used: &HashSet<&str>) -> String {
    if !used.contains("d") {
        return "d".to_string();
    }
    let mut n = 1u32;
    loop {
        let candidate = format!("d{n}");
        if !used.contains(candidate.as_str()) {
            return candidate;
        }
        n += 1;
    }
}
