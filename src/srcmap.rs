//! Source map synthesis for the concatenation path.
//!
//! The script compiler's own concatenation is bypassed in this mode, so
//! the map is reconstructed independently: each input is streamed
//! line-by-line while a monotonic generated-line offset accumulates
//! across inputs, producing one line-granular mapping record per
//! physical line. Columns are always 0; line attribution is enough for
//! debugging without the cost of token-level mapping.

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sourcemap::SourceMapBuilder;

use crate::error::BundleError;
use crate::fetch::RemoteFetcher;
use crate::input::Input;

/// Concatenate inputs line-by-line, collecting mappings, and append the
/// serialized map as an inline data-URI comment.
///
/// Source names are input paths relative to the output directory, in
/// input order. The generated-line offset carried into each input equals
/// the total line count of all previous inputs.
pub fn concat_with_map(
    inputs: &[Input],
    output: &Path,
    resolve_dir: &Path,
    fetcher: &RemoteFetcher,
) -> Result<String> {
    let file = output.to_string_lossy();
    let mut builder = SourceMapBuilder::new(Some(&file));
    let mut out = String::new();
    let mut offset: u32 = 0;

    for (index, input) in inputs.iter().enumerate() {
        let source = input.source_name(resolve_dir, index);
        let mut lines: u32 = 0;
        for line in reader(input, fetcher)?.lines() {
            let line = line.with_context(|| format!("failed to read `{source}`"))?;
            // Generated and original lines are 0-based on the wire.
            builder.add(offset + lines, 0, lines, 0, Some(&source), None, false);
            lines += 1;
            out.push_str(&line);
            out.push('\n');
        }
        offset += lines;
    }

    let map = builder.into_sourcemap();
    let mut json = Vec::new();
    map.to_writer(&mut json)
        .context("failed to serialize source map")?;
    out.push_str(&inline_map_comment(&json));
    Ok(out)
}

/// The trailing comment carrying the map as a base64 data URI.
fn inline_map_comment(json: &[u8]) -> String {
    format!(
        "//# sourceMappingURL=data:application/json;charset=utf-8;base64,{}",
        STANDARD.encode(json)
    )
}

fn reader(input: &Input, fetcher: &RemoteFetcher) -> Result<Box<dyn BufRead>> {
    match input {
        Input::Path(path) => {
            let file = File::open(path).map_err(|e| BundleError::Io(path.clone(), e))?;
            Ok(Box::new(BufReader::new(file)))
        }
        Input::Buffer(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
        Input::Url(url) => Ok(Box::new(Cursor::new(fetcher.fetch(url)?.bytes))),
    }
}
