//! Bindle - bundles scripts, styles, and remote assets into a single
//! browser-ready artifact.
//!
//! An ordered list of inputs (local files, in-memory buffers, remote
//! `http(s)` URLs) is turned into one JavaScript or CSS output file,
//! optionally with an inline source map, lowered and minified for a
//! declarative browser-support query. Externally referenced assets
//! (fonts, images) discovered during compilation are fetched, relocated
//! beside the output, or embedded as data URIs.
//!
//! ```no_run
//! use bindle::{BundleOptions, Input, bundle};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let inputs = [
//!     Input::path("src/reset.css"),
//!     Input::url("https://cdn.example/theme.css"),
//! ];
//! let options = BundleOptions { browsers: "firefox 61".into(), ..Default::default() };
//! bundle(&inputs, Path::new("public/site.css"), &options)?;
//! # Ok(())
//! # }
//! ```

pub mod assemble;
pub mod compile;
pub mod error;
pub mod fetch;
pub mod input;
pub mod loader;
pub mod logger;
pub mod mime;
pub mod options;
pub mod pipeline;
pub mod resolve;
pub mod srcmap;
pub mod target;
mod utils;

pub use error::{BundleError, Diagnostics};
pub use input::Input;
pub use loader::{Loader, LoaderTable};
pub use options::BundleOptions;
pub use pipeline::bundle;
pub use target::TargetMatrix;
