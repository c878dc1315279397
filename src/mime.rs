//! MIME type mapping.
//!
//! Provides consistent content-type handling across the pipeline:
//! - [`extension`] classifies fetched responses (content-type → extension)
//! - [`from_extension`] picks the media type for embedded data URIs

/// Common MIME type constants.
pub mod types {
    // Text
    pub const PLAIN: &str = "text/plain";
    pub const HTML: &str = "text/html";
    pub const CSS: &str = "text/css";
    pub const JAVASCRIPT: &str = "text/javascript";
    pub const JSON: &str = "application/json";
    pub const XML: &str = "application/xml";

    // Binary
    pub const OCTET_STREAM: &str = "application/octet-stream";
    pub const WASM: &str = "application/wasm";

    // Images
    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const GIF: &str = "image/gif";
    pub const WEBP: &str = "image/webp";
    pub const AVIF: &str = "image/avif";
    pub const SVG: &str = "image/svg+xml";
    pub const ICO: &str = "image/x-icon";

    // Fonts
    pub const WOFF: &str = "font/woff";
    pub const WOFF2: &str = "font/woff2";
    pub const TTF: &str = "font/ttf";
    pub const OTF: &str = "font/otf";
    pub const EOT: &str = "application/vnd.ms-fontobject";
}

/// Map a declared content-type to a file extension (without the dot).
///
/// Parameters (`; charset=...`) are ignored; matching is case-insensitive.
/// Returns `None` for types this table does not know, which fails remote
/// resolution at the call site.
pub fn extension(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        // Web / Text
        "text/css" => Some("css"),
        "text/javascript" | "application/javascript" | "application/x-javascript" => Some("js"),
        "text/html" => Some("html"),
        "text/plain" => Some("txt"),
        "application/json" => Some("json"),
        "application/xml" | "text/xml" => Some("xml"),

        // Images
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/avif" => Some("avif"),
        "image/svg+xml" => Some("svg"),
        "image/x-icon" | "image/vnd.microsoft.icon" => Some("ico"),

        // Fonts
        "font/woff" | "application/font-woff" => Some("woff"),
        "font/woff2" => Some("woff2"),
        "font/ttf" | "application/x-font-ttf" => Some("ttf"),
        "font/otf" => Some("otf"),
        "application/vnd.ms-fontobject" => Some("eot"),

        // Binary
        "application/wasm" => Some("wasm"),
        "application/octet-stream" => Some("bin"),

        _ => None,
    }
}

/// Guess MIME type from file extension string (without the dot).
///
/// Used when embedding an asset as a `data:` URI. Unknown extensions fall
/// back to `application/octet-stream`.
pub fn from_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => types::HTML,
        "css" => types::CSS,
        "js" | "mjs" | "cjs" => types::JAVASCRIPT,
        "json" => types::JSON,
        "xml" => types::XML,
        "txt" => types::PLAIN,

        "svg" => types::SVG,
        "png" => types::PNG,
        "jpg" | "jpeg" => types::JPEG,
        "gif" => types::GIF,
        "webp" => types::WEBP,
        "avif" => types::AVIF,
        "ico" => types::ICO,

        "woff" => types::WOFF,
        "woff2" => types::WOFF2,
        "ttf" => types::TTF,
        "otf" => types::OTF,
        "eot" => types::EOT,

        "wasm" => types::WASM,

        _ => types::OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_basic() {
        assert_eq!(extension("text/css"), Some("css"));
        assert_eq!(extension("application/javascript"), Some("js"));
        assert_eq!(extension("font/woff2"), Some("woff2"));
        assert_eq!(extension("image/svg+xml"), Some("svg"));
        assert_eq!(extension("application/octet-stream"), Some("bin"));
    }

    #[test]
    fn test_extension_strips_parameters() {
        assert_eq!(extension("text/css; charset=utf-8"), Some("css"));
        assert_eq!(extension("Text/CSS"), Some("css"));
    }

    #[test]
    fn test_extension_unknown() {
        assert_eq!(extension("application/x-made-up"), None);
        assert_eq!(extension(""), None);
    }

    #[test]
    fn test_from_extension() {
        assert_eq!(from_extension("woff2"), types::WOFF2);
        assert_eq!(from_extension("SVG"), types::SVG);
        assert_eq!(from_extension("xyz"), types::OCTET_STREAM);
    }

    #[test]
    fn test_round_trip_core_types() {
        for ext in ["css", "js", "png", "svg", "woff2"] {
            assert_eq!(extension(from_extension(ext)), Some(ext));
        }
    }
}
