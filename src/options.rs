//! Pipeline configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::loader::Loader;

/// Options for one pipeline run.
///
/// Every field has a default, so the record can be deserialized from an
/// embedder's configuration with only the fields it cares about.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleOptions {
    /// Synthesize (concatenation mode) or request a source map.
    pub source_map: bool,

    /// Browser-support query feeding the target resolver.
    pub browsers: String,

    /// Minify the output. On by default.
    pub minify: bool,

    /// Script mode only: resolve one reference per input instead of
    /// concatenating bytes.
    pub bundle: bool,

    /// Extra loader-table entries for this run (extension → loader).
    /// Built-in entries cannot be overridden.
    pub loaders: HashMap<String, Loader>,
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            source_map: false,
            browsers: "defaults".to_string(),
            minify: true,
            bundle: false,
            loaders: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = BundleOptions::default();
        assert!(!options.source_map);
        assert!(options.minify);
        assert!(!options.bundle);
        assert_eq!(options.browsers, "defaults");
        assert!(options.loaders.is_empty());
    }

    #[test]
    fn test_deserialize_partial() {
        let options: BundleOptions =
            serde_json::from_str(r#"{"browsers": "firefox 61", "minify": false}"#).unwrap();
        assert_eq!(options.browsers, "firefox 61");
        assert!(!options.minify);
        assert!(!options.source_map);
    }
}
