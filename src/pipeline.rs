//! Pipeline orchestration.
//!
//! The public entry point. The output extension selects the mode (`.js`
//! runs the script pipeline, anything else the style pipeline), the
//! components are wired into exactly one downstream compiler invocation,
//! and the output artifact is written only after the compiler reports
//! zero errors.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};

use crate::assemble;
use crate::compile::{script, style};
use crate::error::BundleError;
use crate::fetch::{DEFAULT_USER_AGENT, RemoteFetcher};
use crate::input::Input;
use crate::loader::LoaderTable;
use crate::options::BundleOptions;
use crate::resolve::ResolverChain;
use crate::srcmap;
use crate::target::TargetMatrix;
use crate::utils::path::absolutize;
use crate::{debug, log};

/// Everything a successful compilation produced, held in memory until the
/// single write step at the end of the run.
struct Artifact {
    code: Vec<u8>,
    /// Relocated assets to write beside the output (style mode only).
    assets: Vec<(PathBuf, Vec<u8>)>,
}

/// Bundle `inputs` into `output`.
///
/// Inputs are processed in order; order determines concatenation order
/// and source-map line offsets. The run fails on the first resolution,
/// I/O, or compiler error, and nothing is written in that case. Compiler
/// warnings are logged and do not change the outcome.
pub fn bundle(inputs: &[Input], output: &Path, options: &BundleOptions) -> Result<()> {
    let matrix = TargetMatrix::resolve(&options.browsers)?;

    let mut loaders = LoaderTable::builtin();
    for (ext, loader) in &options.loaders {
        if !loaders.extend(ext, *loader) {
            log!("warning"; "ignoring loader entry for `{ext}`: built-in entries cannot be overridden");
        }
    }
    let loaders = Arc::new(loaders);

    let user_agent = matrix
        .user_agent()
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
    debug!("fetch"; "using User-Agent `{user_agent}`");
    let fetcher = RemoteFetcher::new(user_agent, loaders.clone());

    let output = absolutize(output);
    let resolve_dir = output
        .parent()
        .context("output path has no parent directory")?
        .to_path_buf();
    let chain = ResolverChain::new(fetcher.clone(), &resolve_dir, loaders);

    let is_script = output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("js"));

    let artifact = if is_script {
        run_script(inputs, &output, &resolve_dir, options, &fetcher, &chain)?
    } else {
        run_style(inputs, &output, &resolve_dir, options, &chain, &matrix)?
    };

    fs::create_dir_all(&resolve_dir)
        .map_err(|e| BundleError::Io(resolve_dir.clone(), e))?;
    for (path, bytes) in &artifact.assets {
        debug!("assets"; "{}", path.display());
        fs::write(path, bytes).map_err(|e| BundleError::Io(path.clone(), e))?;
    }
    fs::write(&output, &artifact.code).map_err(|e| BundleError::Io(output.clone(), e))?;
    debug!("bundle"; "wrote {}", output.display());
    Ok(())
}

/// Script mode: bundle sub-variant resolves one reference per input;
/// concatenation sub-variant joins bytes in order, with the source-map
/// synthesizer driving the join when a map was requested.
fn run_script(
    inputs: &[Input],
    output: &Path,
    resolve_dir: &Path,
    options: &BundleOptions,
    fetcher: &RemoteFetcher,
    chain: &ResolverChain,
) -> Result<Artifact> {
    if options.bundle {
        if options.source_map {
            log!("warning"; "source maps are only synthesized in concatenation mode; skipping");
        }
        let entry = assemble::script_entry(inputs, resolve_dir)?;
        let code = script::inline_entry(&entry, chain)?;
        let code = if options.minify {
            script::minify(&code).map_err(BundleError::Compile)?
        } else {
            script::check(&code).map_err(BundleError::Compile)?;
            code
        };
        return Ok(Artifact { code: code.into_bytes(), assets: Vec::new() });
    }

    if options.source_map {
        let code = srcmap::concat_with_map(inputs, output, resolve_dir, fetcher)?;
        // The concatenated stream is the output stream; reprinting would
        // break the line correspondence the map encodes.
        script::check(&code).map_err(BundleError::Compile)?;
        if options.minify {
            log!("warning"; "minification is skipped when synthesizing a source map");
        }
        return Ok(Artifact { code: code.into_bytes(), assets: Vec::new() });
    }

    let bytes = assemble::concat(inputs, fetcher)?;
    let text = String::from_utf8(bytes)
        .map_err(|_| anyhow!("concatenated scripts are not valid UTF-8"))?;
    let code = if options.minify {
        script::minify(&text).map_err(BundleError::Compile)?
    } else {
        script::check(&text).map_err(BundleError::Compile)?;
        text
    };
    Ok(Artifact { code: code.into_bytes(), assets: Vec::new() })
}

/// Style mode: one `@import` per input, bundled so every import — local
/// or remote, direct or transitive — is inlined into one stylesheet.
fn run_style(
    inputs: &[Input],
    output: &Path,
    resolve_dir: &Path,
    options: &BundleOptions,
    chain: &ResolverChain,
    matrix: &TargetMatrix,
) -> Result<Artifact> {
    if options.source_map {
        log!("warning"; "source maps are only synthesized in concatenation mode; skipping");
    }
    let entry = assemble::style_entry(inputs, resolve_dir)?;
    let result = style::bundle_styles(&entry, chain, matrix, options.minify, output)?;
    for warning in &result.warnings {
        log!("warning"; "{warning}");
    }
    Ok(Artifact { code: result.code.into_bytes(), assets: result.assets })
}
