//! Reference resolution and loading.
//!
//! The downstream compilers call back into the pipeline to resolve and
//! load references discovered during compilation. Strategies implement
//! [`Resolver`] and are consulted in registration order; returning `None`
//! means "not mine" and passes the reference to the next strategy.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::BundleError;
use crate::fetch::{self, RemoteFetcher};
use crate::input::is_remote_specifier;
use crate::loader::{Loader, LoaderTable};
use crate::utils::path::absolutize;

/// Which world a resolved reference lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Local,
    Remote,
}

/// A resolved reference: an absolute path or URL plus its namespace.
#[derive(Debug, Clone)]
pub struct Source {
    pub specifier: String,
    pub namespace: Namespace,
}

impl Source {
    pub fn local(specifier: impl Into<String>) -> Self {
        Self { specifier: specifier.into(), namespace: Namespace::Local }
    }

    pub fn remote(specifier: impl Into<String>) -> Self {
        Self { specifier: specifier.into(), namespace: Namespace::Remote }
    }

    pub fn is_remote(&self) -> bool {
        self.namespace == Namespace::Remote
    }
}

/// A loaded reference: bytes plus the loader that should interpret them.
#[derive(Debug, Clone)]
pub struct Resource {
    pub bytes: Vec<u8>,
    pub loader: Loader,
    /// Extension (without the dot) when one could be derived; used for
    /// naming relocated assets and picking data-URI media types.
    pub extension: Option<String>,
}

impl Resource {
    /// The bytes as UTF-8 text, for script/style loaders.
    pub fn into_text(self, origin: &str) -> Result<String, BundleError> {
        String::from_utf8(self.bytes).map_err(|_| {
            BundleError::Unresolved(format!("`{origin}` is not valid UTF-8"))
        })
    }
}

/// One resolve/load strategy.
pub trait Resolver: Send + Sync {
    /// Claim and resolve a reference, or decline with `None`.
    fn resolve(
        &self,
        specifier: &str,
        importer: Option<&Source>,
    ) -> Option<Result<Source, BundleError>>;

    /// Claim and load a resolved source, or decline with `None`.
    fn load(&self, source: &Source) -> Option<Result<Resource, BundleError>>;
}

// ============================================================================
// Remote strategy
// ============================================================================

/// Handles absolute `http(s)` references and anything imported from the
/// remote namespace.
struct RemoteResolver {
    fetcher: RemoteFetcher,
}

impl Resolver for RemoteResolver {
    fn resolve(
        &self,
        specifier: &str,
        importer: Option<&Source>,
    ) -> Option<Result<Source, BundleError>> {
        if is_remote_specifier(specifier) {
            return Some(Ok(Source::remote(specifier)));
        }
        match importer {
            Some(importer) if importer.is_remote() => Some(
                fetch::resolve_url(specifier, &importer.specifier).map(Source::remote),
            ),
            _ => None,
        }
    }

    fn load(&self, source: &Source) -> Option<Result<Resource, BundleError>> {
        if !source.is_remote() {
            return None;
        }
        Some(self.fetcher.fetch(&source.specifier).map(|fetched| Resource {
            bytes: fetched.bytes,
            loader: fetched.loader,
            extension: Some(fetched.extension),
        }))
    }
}

// ============================================================================
// Local strategy
// ============================================================================

/// Catch-all for local references.
///
/// Script/style extensions are read as text for the compilers; everything
/// else is raw bytes tagged for relocation, so fonts and binaries pass
/// through unmodified.
struct LocalResolver {
    base_dir: PathBuf,
    loaders: Arc<LoaderTable>,
}

impl Resolver for LocalResolver {
    fn resolve(
        &self,
        specifier: &str,
        importer: Option<&Source>,
    ) -> Option<Result<Source, BundleError>> {
        let anchored = match importer {
            Some(importer) => Path::new(&importer.specifier)
                .parent()
                .unwrap_or(&self.base_dir)
                .join(specifier),
            None => self.base_dir.join(specifier),
        };
        Some(Ok(Source::local(absolutize(&anchored).to_string_lossy())))
    }

    fn load(&self, source: &Source) -> Option<Result<Resource, BundleError>> {
        if source.is_remote() {
            return None;
        }
        let path = PathBuf::from(&source.specifier);
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let loader = extension.as_deref().and_then(|ext| self.loaders.get(ext));

        let result = match loader {
            Some(loader @ (Loader::Script | Loader::Style)) => fs::read_to_string(&path)
                .map(|text| Resource {
                    bytes: text.into_bytes(),
                    loader,
                    extension: extension.clone(),
                }),
            Some(loader) => fs::read(&path).map(|bytes| Resource {
                bytes,
                loader,
                extension: extension.clone(),
            }),
            None => fs::read(&path).map(|bytes| Resource {
                bytes,
                loader: Loader::Copy,
                extension: extension.clone(),
            }),
        };

        Some(result.map_err(|e| BundleError::Io(path, e)))
    }
}

// ============================================================================
// Chain
// ============================================================================

/// Ordered strategy list consulted per reference.
pub struct ResolverChain {
    resolvers: Vec<Box<dyn Resolver>>,
}

impl ResolverChain {
    /// The standard chain for one run: remote strategy first, local
    /// catch-all second. `base_dir` anchors importer-less references
    /// (entries of the virtual document) and is the output directory.
    pub fn new(fetcher: RemoteFetcher, base_dir: &Path, loaders: Arc<LoaderTable>) -> Self {
        Self {
            resolvers: vec![
                Box::new(RemoteResolver { fetcher }),
                Box::new(LocalResolver { base_dir: absolutize(base_dir), loaders }),
            ],
        }
    }

    pub fn resolve(
        &self,
        specifier: &str,
        importer: Option<&Source>,
    ) -> Result<Source, BundleError> {
        for resolver in &self.resolvers {
            if let Some(result) = resolver.resolve(specifier, importer) {
                return result;
            }
        }
        Err(BundleError::Unresolved(specifier.to_string()))
    }

    pub fn load(&self, source: &Source) -> Result<Resource, BundleError> {
        for resolver in &self.resolvers {
            if let Some(result) = resolver.load(source) {
                return result;
            }
        }
        Err(BundleError::Unresolved(source.specifier.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::DEFAULT_USER_AGENT;
    use std::fs;
    use tempfile::TempDir;

    fn chain(base_dir: &Path) -> ResolverChain {
        let loaders = Arc::new(LoaderTable::builtin());
        let fetcher = RemoteFetcher::new(DEFAULT_USER_AGENT.to_string(), loaders.clone());
        ResolverChain::new(fetcher, base_dir, loaders)
    }

    #[test]
    fn test_absolute_url_enters_remote_namespace() {
        let dir = TempDir::new().unwrap();
        let source = chain(dir.path())
            .resolve("https://cdn.example/a.css", None)
            .unwrap();
        assert!(source.is_remote());
        assert_eq!(source.specifier, "https://cdn.example/a.css");
    }

    #[test]
    fn test_relative_reference_in_remote_namespace_stays_remote() {
        let dir = TempDir::new().unwrap();
        let importer = Source::remote("https://cdn.example/css/style.css");
        let source = chain(dir.path())
            .resolve("../fonts/a.woff2", Some(&importer))
            .unwrap();
        assert!(source.is_remote());
        assert_eq!(source.specifier, "https://cdn.example/fonts/a.woff2");
    }

    #[test]
    fn test_local_reference_anchors_to_importer_dir() {
        let dir = TempDir::new().unwrap();
        let importer = Source::local(dir.path().join("css/style.css").to_string_lossy());
        let source = chain(dir.path()).resolve("logo.png", Some(&importer)).unwrap();
        assert!(!source.is_remote());
        assert_eq!(
            PathBuf::from(&source.specifier),
            absolutize(&dir.path().join("css/logo.png"))
        );
    }

    #[test]
    fn test_local_reference_without_importer_anchors_to_base() {
        let dir = TempDir::new().unwrap();
        let source = chain(dir.path()).resolve("app.js", None).unwrap();
        assert_eq!(
            PathBuf::from(&source.specifier),
            absolutize(&dir.path().join("app.js"))
        );
    }

    #[test]
    fn test_load_script_reads_text() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("app.js");
        fs::write(&file, "var x = 1;").unwrap();

        let resource = chain(dir.path())
            .load(&Source::local(file.to_string_lossy()))
            .unwrap();
        assert_eq!(resource.loader, Loader::Script);
        assert_eq!(resource.bytes, b"var x = 1;");
    }

    #[test]
    fn test_load_unknown_extension_is_copy() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("data.blob");
        fs::write(&file, [0u8, 1, 2, 3]).unwrap();

        let resource = chain(dir.path())
            .load(&Source::local(file.to_string_lossy()))
            .unwrap();
        assert_eq!(resource.loader, Loader::Copy);
        assert_eq!(resource.bytes, vec![0u8, 1, 2, 3]);
    }

    #[test]
    fn test_load_font_extension_is_copy() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("font.woff2");
        fs::write(&file, b"wOF2").unwrap();

        let resource = chain(dir.path())
            .load(&Source::local(file.to_string_lossy()))
            .unwrap();
        assert_eq!(resource.loader, Loader::Copy);
        assert_eq!(resource.extension.as_deref(), Some("woff2"));
    }

    #[test]
    fn test_load_missing_file_propagates_io_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.js");
        let err = chain(dir.path())
            .load(&Source::local(missing.to_string_lossy()))
            .unwrap_err();
        assert!(matches!(err, BundleError::Io(..)), "{err}");
    }
}
