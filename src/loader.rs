//! Loader table: file extension → handling strategy.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a resolved byte stream is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Loader {
    /// Parse as JavaScript.
    Script,
    /// Parse as CSS.
    Style,
    /// Relocate raw bytes into the output directory, uninterpreted.
    Copy,
    /// Embed as a base64 `data:` URI.
    DataUrl,
}

/// Built-in entries. These are never removed or overridden during a run.
const BUILTIN: &[(&str, Loader)] = &[
    (".js", Loader::Script),
    (".mjs", Loader::Script),
    (".cjs", Loader::Script),
    (".css", Loader::Style),
    (".woff", Loader::Copy),
    (".woff2", Loader::Copy),
    (".ttf", Loader::Copy),
    (".otf", Loader::Copy),
    (".eot", Loader::Copy),
    (".png", Loader::Copy),
    (".jpg", Loader::Copy),
    (".jpeg", Loader::Copy),
    (".gif", Loader::Copy),
    (".webp", Loader::Copy),
    (".avif", Loader::Copy),
    (".ico", Loader::Copy),
    (".svg", Loader::DataUrl),
];

/// Extension → loader mapping for one pipeline run.
///
/// Lookup is by lowercase extension including the leading dot. A missing
/// entry is a valid state meaning "caller decides" (both the fetcher and
/// the local classifier fall back to [`Loader::Copy`]).
#[derive(Debug, Clone)]
pub struct LoaderTable {
    entries: HashMap<String, Loader>,
}

impl LoaderTable {
    /// Table seeded with the built-in script/style/font/image entries.
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN
                .iter()
                .map(|(ext, loader)| ((*ext).to_string(), *loader))
                .collect(),
        }
    }

    /// Look up the loader for an extension (with or without leading dot).
    pub fn get(&self, ext: &str) -> Option<Loader> {
        self.entries.get(&normalize(ext)).copied()
    }

    /// Add an entry for one run.
    ///
    /// Built-in entries cannot be shadowed; returns whether the entry was
    /// actually inserted.
    pub fn extend(&mut self, ext: &str, loader: Loader) -> bool {
        let key = normalize(ext);
        if BUILTIN.iter().any(|(builtin, _)| *builtin == key) {
            return false;
        }
        self.entries.insert(key, loader);
        true
    }
}

fn normalize(ext: &str) -> String {
    let lower = ext.to_ascii_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{lower}")
    }
}
