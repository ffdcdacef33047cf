//! Bundle assembler (§4.7): turns a finished module table into the
//! bundle's on-disk text envelope.
//!
//! Format:
//!
//! ```text
//! 📦
//! <byte-len> <asset-name>
//! ↻ <alias>
//! ...
//! ✄
//! <payload 1>
//! ✄
//! <payload 2>
//! ...
//! ```
//!
//! The manifest block lists one `<len> <name>` line per payload in
//! emission order, immediately followed by an `↻ <alias>` line for each
//! alias the module picked up during resolution. A single `✄` line closes
//! the manifest; the payloads themselves follow, each separated from the
//! next by a `\n✄\n` line. Source maps, when present, are emitted as
//! their own payload (named `<asset-name>.map`) immediately *before* the
//! primary payload of the module they belong to — a module's (map,
//! primary) pair is always contiguous, and the entry module's pair comes
//! first.

use crate::module::Module;

const HEADER: &str = "📦";
const SENTINEL: &str = "✄";
const ALIAS_PREFIX: &str = "↻ ";

/// Assemble a bundle's text form from its modules, emitting the entry
/// module's (map, primary) pair first and the rest in alphabetical order,
/// each module's map immediately preceding its own primary.
pub fn assemble(modules: &[Module]) -> String {
    let order = emission_order(modules);

    let mut manifest = vec![HEADER.to_string()];
    let mut payloads = Vec::new();

    for module in &order {
        if let Some(map) = module.map.as_deref() {
            manifest.push(format!("{} {}.map", map.len(), module.name));
            payloads.push(map);
        }
        manifest.push(format!("{} {}", module.source.len(), module.name));
        for alias in &module.aliases {
            manifest.push(format!("{ALIAS_PREFIX}{alias}"));
        }
        payloads.push(module.source.as_str());
    }
    manifest.push(SENTINEL.to_string());

    let mut out = manifest.join("\n");
    out.push('\n');
    out.push_str(&payloads.join(&format!("\n{SENTINEL}\n")));
    out
}

/// Entrypoint first, then every other module sorted by asset name.
fn emission_order(modules: &[Module]) -> Vec<&Module> {
    let mut entries: Vec<&Module> = Vec::with_capacity(modules.len());
    let mut rest: Vec<&Module> = Vec::with_capacity(modules.len());
    for module in modules {
        if module.is_entry {
            entries.push(module);
        } else {
            rest.push(module);
        }
    }
    rest.sort_by(|a, b| a.name.cmp(&b.name));
    entries.extend(rest);
    entries
}
