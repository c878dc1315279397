//! Pipeline error types.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// BundleError
// ============================================================================

/// Errors that abort a pipeline run.
///
/// Resolution failures carry the offending detail (status, content type,
/// URL) so callers can report the first fatal condition verbatim.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("HTTP {status} fetching `{url}`")]
    Status { url: String, status: reqwest::StatusCode },

    #[error("missing content-type header for `{0}`")]
    MissingContentType(String),

    #[error("unknown content-type `{content_type}` for `{url}`")]
    UnknownContentType { url: String, content_type: String },

    #[error("request for `{url}` failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid URL `{url}`")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("IO error reading `{0}`")]
    Io(PathBuf, #[source] io::Error),

    #[error("unresolvable reference `{0}`")]
    Unresolved(String),

    #[error("{0}")]
    Compile(Diagnostics),
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Diagnostics reported by a downstream compiler invocation.
///
/// Errors fail the run as one aggregate failure; warnings are surfaced
/// through the logger and do not change the outcome.
#[derive(Debug, Default)]
pub struct Diagnostics {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Convert to Result (returns Err if there are errors).
    pub fn into_result(self) -> Result<(), Self> {
        if self.errors.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.errors.join("\n"))
    }
}

impl std::error::Error for Diagnostics {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_display_joins_errors() {
        let mut diag = Diagnostics::new();
        diag.error("first");
        diag.error("second");
        assert_eq!(format!("{diag}"), "first\nsecond");
    }

    #[test]
    fn test_diagnostics_into_result() {
        let mut diag = Diagnostics::new();
        diag.warn("just a warning");
        assert!(diag.into_result().is_ok());

        let mut diag = Diagnostics::new();
        diag.error("broken");
        assert!(diag.into_result().is_err());
    }

    #[test]
    fn test_status_error_names_status_and_url() {
        let err = BundleError::Status {
            url: "https://cdn.example/a.css".into(),
            status: reqwest::StatusCode::NOT_FOUND,
        };
        let text = format!("{err}");
        assert!(text.contains("404"));
        assert!(text.contains("https://cdn.example/a.css"));
    }
}
