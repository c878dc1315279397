//! CSS compilation via lightningcss.
//!
//! The virtual entry document is bundled so every `@import` — including
//! transitively discovered remote ones — is inlined into one stylesheet.
//! The bundler's resolve/read callbacks delegate to the resolver chain,
//! and a post-bundle pass relocates or embeds `url()` references.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use lightningcss::bundler::{Bundler, ResolveResult, SourceProvider};
use lightningcss::rules::CssRule;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions};
use lightningcss::values::url::Url as CssUrl;
use lightningcss::visit_types;
use lightningcss::visitor::{Visit, VisitTypes, Visitor};
use parking_lot::Mutex;

use crate::input::is_remote_specifier;
use crate::loader::Loader;
use crate::mime;
use crate::resolve::{ResolverChain, Source};
use crate::target::TargetMatrix;
use crate::utils::hash;

/// Result of a style compilation.
pub struct StyleOutput {
    pub code: String,
    /// Relocated assets to write next to the output, in discovery order.
    pub assets: Vec<(PathBuf, Vec<u8>)>,
    pub warnings: Vec<String>,
}

/// Bundle the entry document into a single stylesheet.
///
/// Browser targets are always applied at print time; rule-level
/// minification transforms run only when `minify` is requested, so
/// unminified output preserves input rules verbatim.
pub fn bundle_styles(
    entry: &str,
    chain: &ResolverChain,
    matrix: &TargetMatrix,
    minify: bool,
    output: &Path,
) -> Result<StyleOutput> {
    let output_dir = output.parent().unwrap_or(Path::new(".")).to_path_buf();
    let provider = ChainProvider::new(output, entry.to_string(), chain);
    let mut bundler = Bundler::new(&provider, None, ParserOptions::default());
    let mut stylesheet = bundler
        .bundle(output)
        .map_err(|e| anyhow!("failed to bundle stylesheets: {e:?}"))?;

    let mut rewriter = AssetRewriter {
        chain,
        sources: stylesheet.sources.clone(),
        output_dir,
        assets: Vec::new(),
        warnings: Vec::new(),
        current_source_index: 0,
    };
    stylesheet.visit(&mut rewriter)?;

    if minify {
        stylesheet
            .minify(MinifyOptions {
                targets: matrix.css_targets(),
                ..MinifyOptions::default()
            })
            .map_err(|e| anyhow!("failed to transform stylesheet: {e:?}"))?;
    }

    let result = stylesheet
        .to_css(PrinterOptions {
            minify,
            targets: matrix.css_targets(),
            ..PrinterOptions::default()
        })
        .map_err(|e| anyhow!("failed to print stylesheet: {e:?}"))?;

    Ok(StyleOutput {
        code: result.code,
        assets: rewriter.assets,
        warnings: rewriter.warnings,
    })
}

// ============================================================================
// Source provider
// ============================================================================

#[derive(Debug)]
struct ProviderError(String);

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ProviderError {}

/// Feeds the bundler: the virtual entry from memory, local stylesheets
/// from disk, remote stylesheets through the resolver chain.
struct ChainProvider<'a> {
    entry_path: PathBuf,
    entry_source: String,
    chain: &'a ResolverChain,
    // Fetched sources live until the provider drops; the bundler borrows
    // them for the stylesheet's lifetime.
    stashed: Mutex<Vec<*mut String>>,
}

unsafe impl Send for ChainProvider<'_> {}
unsafe impl Sync for ChainProvider<'_> {}

impl<'a> ChainProvider<'a> {
    fn new(entry_path: &Path, entry_source: String, chain: &'a ResolverChain) -> Self {
        Self {
            entry_path: entry_path.to_path_buf(),
            entry_source,
            chain,
            stashed: Mutex::new(Vec::new()),
        }
    }

    fn stash(&self, source: String) -> &str {
        let ptr = Box::into_raw(Box::new(source));
        self.stashed.lock().push(ptr);
        // Pointers are freed in Drop and never removed before then.
        unsafe { &*ptr }
    }
}

impl Drop for ChainProvider<'_> {
    fn drop(&mut self) {
        for ptr in self.stashed.get_mut().drain(..) {
            drop(unsafe { Box::from_raw(ptr) });
        }
    }
}

impl SourceProvider for ChainProvider<'_> {
    type Error = ProviderError;

    fn read<'s>(&'s self, file: &Path) -> Result<&'s str, Self::Error> {
        if file == self.entry_path {
            return Ok(&self.entry_source);
        }

        let specifier = file.to_string_lossy();
        if is_remote_specifier(&specifier) {
            let resource = self
                .chain
                .load(&Source::remote(specifier.as_ref()))
                .map_err(|e| ProviderError(e.to_string()))?;
            if resource.loader != Loader::Style {
                return Err(ProviderError(format!(
                    "`{specifier}` resolved to a {:?} resource, expected a stylesheet",
                    resource.loader
                )));
            }
            let text = resource
                .into_text(&specifier)
                .map_err(|e| ProviderError(e.to_string()))?;
            Ok(self.stash(text))
        } else {
            let text = std::fs::read_to_string(file)
                .map_err(|e| ProviderError(format!("IO error reading `{}`: {e}", file.display())))?;
            Ok(self.stash(text))
        }
    }

    fn resolve(&self, specifier: &str, originating_file: &Path) -> Result<ResolveResult, Self::Error> {
        let importer_spec = originating_file.to_string_lossy();
        let importer = if is_remote_specifier(&importer_spec) {
            Source::remote(importer_spec.as_ref())
        } else {
            Source::local(importer_spec.as_ref())
        };
        let source = self
            .chain
            .resolve(specifier, Some(&importer))
            .map_err(|e| ProviderError(e.to_string()))?;
        Ok(ResolveResult::File(PathBuf::from(source.specifier)))
    }
}

// ============================================================================
// url() relocation
// ============================================================================

/// Rewrites `url()` references of the bundled stylesheet.
///
/// Copy-classified resources are written into the output directory under
/// a content-fingerprinted name; DataUrl-classified resources are
/// embedded as base64 `data:` URIs. References resolve in the namespace
/// of the stylesheet that declared them.
struct AssetRewriter<'a> {
    chain: &'a ResolverChain,
    sources: Vec<String>,
    output_dir: PathBuf,
    assets: Vec<(PathBuf, Vec<u8>)>,
    warnings: Vec<String>,
    // Source file of the rule currently being visited, tracked because
    // `Url::loc` (unlike a rule's own `loc`) doesn't carry a source index.
    current_source_index: u32,
}

impl<'i> Visitor<'i> for AssetRewriter<'_> {
    type Error = anyhow::Error;

    fn visit_types(&self) -> VisitTypes {
        visit_types!(RULES | URLS)
    }

    fn visit_rule(&mut self, rule: &mut CssRule<'i>) -> Result<(), Self::Error> {
        if let Some(source_index) = rule_source_index(rule) {
            self.current_source_index = source_index;
        }
        rule.visit_children(self)
    }

    fn visit_url(&mut self, url: &mut CssUrl<'i>) -> Result<(), Self::Error> {
        let reference = url.url.to_string();
        if reference.is_empty() || reference.starts_with("data:") || reference.starts_with('#') {
            return Ok(());
        }

        let importer = self
            .sources
            .get(self.current_source_index as usize)
            .map(|s| {
                if is_remote_specifier(s) {
                    Source::remote(s.clone())
                } else {
                    Source::local(s.clone())
                }
            });
        let resolved = self.chain.resolve(&reference, importer.as_ref())?;
        let resource = self.chain.load(&resolved)?;

        match resource.loader {
            Loader::Copy => {
                let name = relocated_name(
                    &resolved.specifier,
                    resource.extension.as_deref(),
                    &resource.bytes,
                );
                self.assets.push((self.output_dir.join(&name), resource.bytes));
                url.url = name.into();
            }
            Loader::DataUrl => {
                let media = mime::from_extension(resource.extension.as_deref().unwrap_or_default());
                let encoded = STANDARD.encode(&resource.bytes);
                url.url = format!("data:{media};base64,{encoded}").into();
            }
            other => {
                self.warnings
                    .push(format!("leaving `{reference}` in place ({other:?} loader)"));
            }
        }
        Ok(())
    }
}

/// Extracts the source index recorded on a rule's own location, where
/// available. Not every rule variant carries a location.
fn rule_source_index(rule: &CssRule<'_>) -> Option<u32> {
    match rule {
        CssRule::Media(r) => Some(r.loc.source_index),
        CssRule::Import(r) => Some(r.loc.source_index),
        CssRule::Style(r) => Some(r.loc.source_index),
        CssRule::Keyframes(r) => Some(r.loc.source_index),
        CssRule::FontFace(r) => Some(r.loc.source_index),
        CssRule::FontPaletteValues(r) => Some(r.loc.source_index),
        CssRule::FontFeatureValues(r) => Some(r.loc.source_index),
        CssRule::Page(r) => Some(r.loc.source_index),
        CssRule::Supports(r) => Some(r.loc.source_index),
        CssRule::CounterStyle(r) => Some(r.loc.source_index),
        CssRule::Namespace(r) => Some(r.loc.source_index),
        CssRule::MozDocument(r) => Some(r.loc.source_index),
        CssRule::Nesting(r) => Some(r.loc.source_index),
        CssRule::NestedDeclarations(r) => Some(r.loc.source_index),
        CssRule::Viewport(r) => Some(r.loc.source_index),
        CssRule::CustomMedia(r) => Some(r.loc.source_index),
        CssRule::LayerStatement(r) => Some(r.loc.source_index),
        CssRule::LayerBlock(r) => Some(r.loc.source_index),
        CssRule::Property(r) => Some(r.loc.source_index),
        CssRule::Container(r) => Some(r.loc.source_index),
        CssRule::Scope(r) => Some(r.loc.source_index),
        CssRule::StartingStyle(r) => Some(r.loc.source_index),
        CssRule::ViewTransition(r) => Some(r.loc.source_index),
        CssRule::PositionTry(r) => Some(r.loc.source_index),
        CssRule::Ignored | CssRule::Unknown(_) | CssRule::Custom(_) => None,
    }
}

/// Content-fingerprinted filename for a relocated asset.
fn relocated_name(specifier: &str, extension: Option<&str>, bytes: &[u8]) -> String {
    let file_name = specifier.rsplit('/').next().unwrap_or(specifier);
    let file_name = file_name.split(['?', '#']).next().unwrap_or(file_name);
    let stem = file_name
        .rsplit_once('.')
        .map_or(file_name, |(stem, _)| stem);
    let stem = if stem.is_empty() { "asset" } else { stem };
    let ext = extension.unwrap_or("bin");
    format!("{stem}.{}.{ext}", hash::fingerprint(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{DEFAULT_USER_AGENT, RemoteFetcher};
    use crate::loader::LoaderTable;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn chain(base_dir: &Path) -> ResolverChain {
        let loaders = Arc::new(LoaderTable::builtin());
        let fetcher = RemoteFetcher::new(DEFAULT_USER_AGENT.to_string(), loaders.clone());
        ResolverChain::new(fetcher, base_dir, loaders)
    }

    fn matrix() -> TargetMatrix {
        TargetMatrix::resolve("defaults").unwrap()
    }

    #[test]
    fn test_bundle_inlines_imports_in_order() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.css"), ".a { color: red; }\n").unwrap();
        fs::write(dir.path().join("b.css"), ".a { color: blue; }\n").unwrap();

        let output = dir.path().join("out.css");
        let entry = "@import \"a.css\";\n@import \"b.css\";\n";
        let result =
            bundle_styles(entry, &chain(dir.path()), &matrix(), false, &output).unwrap();

        let red = result.code.find("color: red").expect("first rule kept");
        let blue = result.code.find("color: blue").expect("second rule kept");
        assert!(red < blue, "rules out of order:\n{}", result.code);
    }

    #[test]
    fn test_bundle_minifies_when_requested() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.css"), ".a {\n  color: #ff0000;\n}\n").unwrap();

        let output = dir.path().join("out.css");
        let source_len = ".a {\n  color: #ff0000;\n}\n".len();
        let result =
            bundle_styles("@import \"a.css\";\n", &chain(dir.path()), &matrix(), true, &output)
                .unwrap();
        assert!(result.code.len() < source_len, "{}", result.code);
        assert!(result.code.contains("red"), "{}", result.code);
    }

    #[test]
    fn test_local_font_reference_is_relocated() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("font.woff2"), b"wOF2fake").unwrap();
        fs::write(
            dir.path().join("a.css"),
            "@font-face { font-family: X; src: url(\"font.woff2\"); }\n",
        )
        .unwrap();

        let output = dir.path().join("out.css");
        let result =
            bundle_styles("@import \"a.css\";\n", &chain(dir.path()), &matrix(), false, &output)
                .unwrap();

        assert_eq!(result.assets.len(), 1);
        let (asset_path, bytes) = &result.assets[0];
        let name = asset_path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("font."), "{name}");
        assert!(name.ends_with(".woff2"), "{name}");
        assert_eq!(bytes, b"wOF2fake");
        assert!(result.code.contains(name.as_ref()));
    }

    #[test]
    fn test_svg_reference_is_embedded_as_data_uri() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("icon.svg"), "<svg></svg>").unwrap();
        fs::write(
            dir.path().join("a.css"),
            ".icon { background: url(\"icon.svg\"); }\n",
        )
        .unwrap();

        let output = dir.path().join("out.css");
        let result =
            bundle_styles("@import \"a.css\";\n", &chain(dir.path()), &matrix(), false, &output)
                .unwrap();

        assert!(result.assets.is_empty());
        assert!(
            result.code.contains("data:image/svg+xml;base64,"),
            "{}",
            result.code
        );
    }

    #[test]
    fn test_existing_data_uri_untouched() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("a.css"),
            ".icon { background: url(\"data:image/png;base64,AAAA\"); }\n",
        )
        .unwrap();

        let output = dir.path().join("out.css");
        let result =
            bundle_styles("@import \"a.css\";\n", &chain(dir.path()), &matrix(), false, &output)
                .unwrap();
        assert!(result.code.contains("data:image/png;base64,AAAA"));
    }

    #[test]
    fn test_missing_import_fails() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.css");
        let result =
            bundle_styles("@import \"missing.css\";\n", &chain(dir.path()), &matrix(), false, &output);
        assert!(result.is_err());
    }

    #[test]
    fn test_relocated_name_shape() {
        let name = relocated_name("https://cdn.example/fonts/body.woff2?v=3", Some("woff2"), b"abc");
        assert!(name.starts_with("body."));
        assert!(name.ends_with(".woff2"));
        assert_eq!(name.len(), "body.".len() + 8 + ".woff2".len());
    }
}
