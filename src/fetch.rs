//! Remote resource fetching.
//!
//! Resolves `http(s)://` references discovered before and during
//! compilation. Fetched bytes are classified through the response
//! content-type, translated to an extension and then through the loader
//! table. One GET per resource, no retries, no caching across runs.

use std::sync::{Arc, LazyLock};

use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};

use crate::error::BundleError;
use crate::loader::{Loader, LoaderTable};
use crate::mime;

/// User-Agent sent when the target matrix contains no recognized engine
/// family. A named default, overridden per run by the synthesized UA.
pub const DEFAULT_USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

static FETCH_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build fetch runtime")
});

static HTTP_CLIENT: LazyLock<Client> =
    LazyLock::new(|| Client::builder().build().expect("failed to construct HTTP client"));

/// A remote resource after fetch and classification.
#[derive(Debug, Clone)]
pub struct FetchedResource {
    /// Resolved absolute URL.
    pub url: String,
    /// Raw response bytes.
    pub bytes: Vec<u8>,
    /// Declared content-type, as received.
    pub content_type: String,
    /// Extension derived from the content-type (without the dot).
    pub extension: String,
    /// Loader selected for the derived extension.
    pub loader: Loader,
}

/// Fetches remote references with the synthesized User-Agent.
///
/// Holds no per-invocation state; safe to call concurrently from the
/// compiler's resolve/load callbacks.
#[derive(Debug, Clone)]
pub struct RemoteFetcher {
    user_agent: String,
    loaders: Arc<LoaderTable>,
}

impl RemoteFetcher {
    pub fn new(user_agent: String, loaders: Arc<LoaderTable>) -> Self {
        Self { user_agent, loaders }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Issue a single GET and classify the response.
    ///
    /// Fails on non-2xx status, on a missing content-type header, and on
    /// a content-type the MIME table cannot map to an extension. An
    /// extension absent from the loader table falls back to
    /// [`Loader::Copy`].
    pub fn fetch(&self, url: &str) -> Result<FetchedResource, BundleError> {
        FETCH_RUNTIME.block_on(async {
            let response = HTTP_CLIENT
                .get(url)
                .header(USER_AGENT, self.user_agent.as_str())
                .send()
                .await
                .map_err(|source| BundleError::Transport { url: url.to_string(), source })?;

            let status = response.status();
            if !status.is_success() {
                return Err(BundleError::Status { url: url.to_string(), status });
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned)
                .ok_or_else(|| BundleError::MissingContentType(url.to_string()))?;

            let extension = mime::extension(&content_type)
                .ok_or_else(|| BundleError::UnknownContentType {
                    url: url.to_string(),
                    content_type: content_type.clone(),
                })?
                .to_string();

            let loader = self.loaders.get(&extension).unwrap_or(Loader::Copy);

            let bytes = response
                .bytes()
                .await
                .map_err(|source| BundleError::Transport { url: url.to_string(), source })?
                .to_vec();

            Ok(FetchedResource {
                url: url.to_string(),
                bytes,
                content_type,
                extension,
                loader,
            })
        })
    }
}

/// Resolve a reference discovered inside remote content against its
/// importer's URL, staying in the remote namespace.
pub fn resolve_url(reference: &str, importer: &str) -> Result<String, BundleError> {
    let base = url::Url::parse(importer).map_err(|source| BundleError::InvalidUrl {
        url: importer.to_string(),
        source,
    })?;
    let joined = base.join(reference).map_err(|source| BundleError::InvalidUrl {
        url: reference.to_string(),
        source,
    })?;
    Ok(joined.to_string())
}
