//! JavaScript compilation via oxc.

use std::sync::LazyLock;

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use regex::Regex;

use crate::error::{BundleError, Diagnostics};
use crate::loader::Loader;
use crate::resolve::ResolverChain;

/// Parse-only validation. The pipeline resolves successfully only when
/// the parser reports zero errors, even on paths that write input bytes
/// through unchanged.
pub fn check(source: &str) -> Result<(), Diagnostics> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::cjs()).parse();
    if ret.errors.is_empty() {
        Ok(())
    } else {
        let mut diag = Diagnostics::new();
        for error in &ret.errors {
            diag.error(error.to_string());
        }
        Err(diag)
    }
}

/// Minify JavaScript source code.
pub fn minify(source: &str) -> Result<String, Diagnostics> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::cjs()).parse();
    if !ret.errors.is_empty() {
        let mut diag = Diagnostics::new();
        for error in &ret.errors {
            diag.error(error.to_string());
        }
        return Err(diag);
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

static REQUIRE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^require\("(.+)"\);\s*$"#).expect("valid regex"));

/// Inline the references of a bundle-mode entry document.
///
/// Each `require("…")` statement is replaced by the referenced input's
/// contents wrapped in an IIFE, so private bindings do not leak across
/// segment boundaries. References must classify as scripts.
pub fn inline_entry(entry: &str, chain: &ResolverChain) -> Result<String, BundleError> {
    let mut out = String::new();
    for line in entry.lines() {
        let Some(caps) = REQUIRE_RE.captures(line) else {
            if !line.trim().is_empty() {
                out.push_str(line);
                out.push('\n');
            }
            continue;
        };
        let specifier = &caps[1];
        let source = chain.resolve(specifier, None)?;
        let resource = chain.load(&source)?;
        if resource.loader != Loader::Script {
            return Err(BundleError::Unresolved(format!(
                "`{specifier}` resolved to a {:?} resource, expected a script",
                resource.loader
            )));
        }
        let text = resource.into_text(specifier)?;
        out.push_str("(function() {\n");
        out.push_str(&text);
        if !text.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("})();\n");
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{DEFAULT_USER_AGENT, RemoteFetcher};
    use crate::loader::LoaderTable;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_minify_shrinks_and_preserves_behavior() {
        let source = "function add(first, second) {\n  return first + second;\n}\nconsole.log(add(1, 2));\n";
        let code = minify(source).unwrap();
        assert!(code.len() < source.len());
        assert!(code.contains("console.log"));
    }

    #[test]
    fn test_minify_surfaces_parse_errors() {
        let err = minify("var = ;").unwrap_err();
        assert!(err.has_errors());
    }

    #[test]
    fn test_check_accepts_require_style_code() {
        assert!(check("require(\"./a.js\");\nvar x = 1;\n").is_ok());
        assert!(check("function (").is_err());
    }

    #[test]
    fn test_inline_entry_wraps_segments() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.js"), "var hidden = 1;").unwrap();
        fs::write(dir.path().join("b.js"), "var hidden = 2;\n").unwrap();

        let loaders = Arc::new(LoaderTable::builtin());
        let fetcher = RemoteFetcher::new(DEFAULT_USER_AGENT.to_string(), loaders.clone());
        let chain = ResolverChain::new(fetcher, dir.path(), loaders);

        let entry = "require(\"./a.js\");\nrequire(\"./b.js\");\n";
        let code = inline_entry(entry, &chain).unwrap();
        assert_eq!(
            code,
            "(function() {\nvar hidden = 1;\n})();\n(function() {\nvar hidden = 2;\n})();\n"
        );
        // The wrapped result is itself valid and minifiable.
        assert!(minify(&code).is_ok());
    }

    #[test]
    fn test_inline_entry_rejects_non_script_reference() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("font.woff2"), b"wOF2").unwrap();

        let loaders = Arc::new(LoaderTable::builtin());
        let fetcher = RemoteFetcher::new(DEFAULT_USER_AGENT.to_string(), loaders.clone());
        let chain = ResolverChain::new(fetcher, dir.path(), loaders);

        let err = inline_entry("require(\"./font.woff2\");\n", &chain).unwrap_err();
        assert!(format!("{err}").contains("expected a script"));
    }
}
