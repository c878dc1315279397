//! Browser target resolution.
//!
//! Turns a browser-support query (e.g. `"defaults"`, `"firefox 61"`) into
//! the concrete target matrix consumed by the downstream compilers, and
//! derives the synthetic User-Agent string used for outbound fetches.

use anyhow::{Result, anyhow};
use browserslist::{Distrib, Opts};
use lightningcss::targets::{Browsers, Targets};

/// Engine families recognized for UA synthesis, in fixed priority order.
const UA_FAMILIES: &[&str] = &["firefox", "safari", "chrome"];

/// The resolved set of (engine, version) compatibility targets.
#[derive(Debug, Clone)]
pub struct TargetMatrix {
    distribs: Vec<Distrib>,
}

impl TargetMatrix {
    /// Evaluate a browser-support query against the capability database.
    pub fn resolve(query: &str) -> Result<Self> {
        let distribs = browserslist::resolve([query], &Opts::default())
            .map_err(|e| anyhow!("failed to resolve browser query `{query}`: {e}"))?;
        Ok(Self { distribs })
    }

    pub fn is_empty(&self) -> bool {
        self.distribs.is_empty()
    }

    /// Minimum supported version per engine family, in the form the CSS
    /// compiler consumes for lowering and prefixing decisions.
    pub fn browsers(&self) -> Option<Browsers> {
        let mut browsers = Browsers::default();
        let mut any = false;

        for distrib in &self.distribs {
            let Some(version) = encode_version(distrib.version()) else {
                continue;
            };
            let slot = match distrib.name() {
                "android" => &mut browsers.android,
                "chrome" | "and_chr" => &mut browsers.chrome,
                "edge" => &mut browsers.edge,
                "firefox" | "and_ff" => &mut browsers.firefox,
                "ie" => &mut browsers.ie,
                "ios_saf" => &mut browsers.ios_saf,
                "opera" | "op_mob" => &mut browsers.opera,
                "safari" => &mut browsers.safari,
                "samsung" => &mut browsers.samsung,
                _ => continue,
            };
            any = true;
            *slot = Some(slot.map_or(version, |existing| existing.min(version)));
        }

        any.then_some(browsers)
    }

    /// Targets record for the CSS compiler.
    pub fn css_targets(&self) -> Targets {
        Targets {
            browsers: self.browsers(),
            ..Targets::default()
        }
    }

    /// Derive a synthetic User-Agent string from the matrix.
    ///
    /// Remote font/asset servers vary payloads by client capability sniffed
    /// from the UA. Taking the minimum supported version of the first
    /// matching family keeps fetched assets compatible with the least
    /// capable browser the build targets. Returns `None` when no
    /// recognized family appears; callers fall back to the crate default.
    pub fn user_agent(&self) -> Option<String> {
        for family in UA_FAMILIES {
            let min = self
                .distribs
                .iter()
                .filter(|d| d.name() == *family)
                .filter_map(|d| numeric_version(d.version()))
                .fold(None::<f64>, |acc, v| {
                    Some(acc.map_or(v, |existing| existing.min(v)))
                });
            if let Some(version) = min {
                return Some(ua_string(family, version));
            }
        }
        None
    }
}

fn ua_string(family: &str, version: f64) -> String {
    match family {
        "firefox" => format!(
            "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/{version}.0"
        ),
        "safari" => format!(
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/{version}.0 Safari/605.1.15"
        ),
        _ => format!(
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{version}.0 Safari/537.36"
        ),
    }
}

/// Parse a distribution version into a comparable number.
///
/// Range versions ("15.2-15.3") use their lower bound; only the first two
/// dotted components are significant. Non-numeric versions ("all") yield
/// `None`.
fn numeric_version(version: &str) -> Option<f64> {
    let lower = version.split('-').next().unwrap_or_default();
    let mut parts = lower.split('.');
    let major: u32 = parts.next()?.parse().ok()?;
    match parts.next() {
        Some(minor) => format!("{major}.{minor}").parse().ok(),
        None => Some(f64::from(major)),
    }
}

/// Encode a version for the CSS target record: `major << 16 | minor << 8`.
fn encode_version(version: &str) -> Option<u32> {
    let lower = version.split('-').next().unwrap_or_default();
    let mut parts = lower.split('.');
    let major: u32 = parts.next()?.parse().ok()?;
    let minor: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let patch: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    Some((major << 16) | (minor << 8) | patch)
}
