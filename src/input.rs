//! Bundle input model.

use std::path::{Path, PathBuf};

use crate::utils::path::{relative_to, to_slash};

/// One unit of content to be bundled.
///
/// Inputs form an ordered sequence; order determines concatenation order
/// and source-map line offsets, and is never reordered by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A file on disk.
    Path(PathBuf),
    /// In-memory bytes, already complete.
    Buffer(Vec<u8>),
    /// A remote `http(s)` resource.
    Url(String),
}

impl Input {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn buffer(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Buffer(bytes.into())
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Url(_))
    }

    /// The name this input carries in a synthesized source map.
    ///
    /// Local files use their path relative to the output directory, remote
    /// inputs their URL; buffers have no path, so they get a stable
    /// synthetic name keyed by position.
    pub(crate) fn source_name(&self, resolve_dir: &Path, index: usize) -> String {
        match self {
            Self::Path(path) => to_slash(&relative_to(resolve_dir, path)),
            Self::Url(url) => url.clone(),
            Self::Buffer(_) => format!("<buffer:{index}>"),
        }
    }
}

impl From<&str> for Input {
    /// Classify a bare string the way the original inputs were classified:
    /// `http(s)://` prefixes are remote, everything else is a local path.
    fn from(value: &str) -> Self {
        if is_remote_specifier(value) {
            Self::Url(value.to_string())
        } else {
            Self::Path(PathBuf::from(value))
        }
    }
}

impl From<PathBuf> for Input {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<Vec<u8>> for Input {
    fn from(value: Vec<u8>) -> Self {
        Self::Buffer(value)
    }
}

/// Whether a reference names a remote resource.
pub(crate) fn is_remote_specifier(specifier: &str) -> bool {
    specifier.starts_with("http://") || specifier.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_classifies() {
        assert!(matches!(Input::from("https://cdn.example/a.css"), Input::Url(_)));
        assert!(matches!(Input::from("http://cdn.example/a.css"), Input::Url(_)));
        assert!(matches!(Input::from("src/app.js"), Input::Path(_)));
        assert!(matches!(Input::from("httpish/file.js"), Input::Path(_)));
    }

    #[test]
    fn test_source_name_relative_path() {
        let input = Input::path("/site/src/app.js");
        assert_eq!(input.source_name(Path::new("/site/out"), 0), "../src/app.js");
    }

    #[test]
    fn test_source_name_url_and_buffer() {
        let url = Input::url("https://cdn.example/lib.js");
        assert_eq!(url.source_name(Path::new("/out"), 3), "https://cdn.example/lib.js");

        let buf = Input::buffer(b"var x;".to_vec());
        assert_eq!(buf.source_name(Path::new("/out"), 3), "<buffer:3>");
    }
}
