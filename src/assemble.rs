//! Virtual document assembly.
//!
//! Builds the single entry document handed to the downstream compiler:
//! `@import` statements for style mode, `require` references for script
//! bundle mode, and an ordered byte join for script concatenation mode.

use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::{Result, bail};

use crate::error::BundleError;
use crate::fetch::RemoteFetcher;
use crate::input::Input;
use crate::utils::path::{relative_to, to_slash};

/// One `@import` per input, in order. Remote inputs import their absolute
/// URL literal, local inputs their path relative to the output directory.
pub fn style_entry(inputs: &[Input], resolve_dir: &Path) -> Result<String> {
    let mut entry = String::new();
    for input in inputs {
        match input {
            Input::Url(url) => entry.push_str(&format!("@import \"{url}\";\n")),
            Input::Path(path) => {
                let rel = to_slash(&relative_to(resolve_dir, path));
                entry.push_str(&format!("@import \"{rel}\";\n"));
            }
            Input::Buffer(_) => {
                bail!("in-memory buffer inputs are not supported in style mode")
            }
        }
    }
    Ok(entry)
}

/// One `require` reference per input, in order, for script bundle mode.
pub fn script_entry(inputs: &[Input], resolve_dir: &Path) -> Result<String> {
    let mut entry = String::new();
    for input in inputs {
        match input {
            Input::Url(url) => entry.push_str(&format!("require(\"{url}\");\n")),
            Input::Path(path) => {
                let rel = to_slash(&relative_to(resolve_dir, path));
                let rel = if rel.starts_with("../") { rel } else { format!("./{rel}") };
                entry.push_str(&format!("require(\"{rel}\");\n"));
            }
            Input::Buffer(_) => {
                bail!("in-memory buffer inputs are not supported in script bundle mode")
            }
        }
    }
    Ok(entry)
}

/// Ordered byte-for-byte join of every input.
///
/// Local files are streamed through `io::copy` so no input needs to be
/// fully resident beside the output buffer; emission order is input order.
pub fn concat(inputs: &[Input], fetcher: &RemoteFetcher) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for input in inputs {
        match input {
            Input::Path(path) => {
                let mut file =
                    File::open(path).map_err(|e| BundleError::Io(path.clone(), e))?;
                io::copy(&mut file, &mut out)
                    .map_err(|e| BundleError::Io(path.clone(), e))?;
            }
            Input::Buffer(bytes) => out.extend_from_slice(bytes),
            Input::Url(url) => out.extend_from_slice(&fetcher.fetch(url)?.bytes),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::DEFAULT_USER_AGENT;
    use crate::loader::LoaderTable;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn fetcher() -> RemoteFetcher {
        RemoteFetcher::new(DEFAULT_USER_AGENT.to_string(), Arc::new(LoaderTable::builtin()))
    }

    #[test]
    fn test_style_entry_mixes_local_and_remote() {
        let inputs = vec![
            Input::path("/site/src/base.css"),
            Input::url("https://cdn.example/theme.css"),
        ];
        let entry = style_entry(&inputs, Path::new("/site/out")).unwrap();
        assert_eq!(
            entry,
            "@import \"../src/base.css\";\n@import \"https://cdn.example/theme.css\";\n"
        );
    }

    #[test]
    fn test_style_entry_rejects_buffers() {
        let inputs = vec![Input::buffer(b"body {}".to_vec())];
        assert!(style_entry(&inputs, Path::new("/out")).is_err());
    }

    #[test]
    fn test_script_entry_references() {
        let inputs = vec![
            Input::path("/out/lib/a.js"),
            Input::path("/src/b.js"),
            Input::url("https://cdn.example/c.js"),
        ];
        let entry = script_entry(&inputs, Path::new("/out")).unwrap();
        assert_eq!(
            entry,
            "require(\"./lib/a.js\");\nrequire(\"../src/b.js\");\nrequire(\"https://cdn.example/c.js\");\n"
        );
    }

    #[test]
    fn test_concat_preserves_order_and_bytes() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.js");
        let b = dir.path().join("b.js");
        fs::write(&a, "var a = 1;\n").unwrap();
        fs::write(&b, "var b = 2;").unwrap();

        let inputs = vec![
            Input::path(a),
            Input::buffer(b"/* between */".to_vec()),
            Input::path(b),
        ];
        let out = concat(&inputs, &fetcher()).unwrap();
        assert_eq!(out, b"var a = 1;\n/* between */var b = 2;");
    }

    #[test]
    fn test_concat_missing_file_fails() {
        let inputs = vec![Input::Path(PathBuf::from("/nonexistent/file.js"))];
        assert!(concat(&inputs, &fetcher()).is_err());
    }
}
