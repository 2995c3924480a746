//! MIME type detection.
//!
//! Fixed extension-to-MIME lookup used by the HTTP gateway. Unknown
//! extensions default to an opaque binary type.

use std::path::Path;

/// Common MIME type constants.
pub mod types {
    pub const HTML: &str = "text/html; charset=utf-8";
    pub const PLAIN: &str = "text/plain; charset=utf-8";
    pub const CSS: &str = "text/css; charset=utf-8";
    pub const JAVASCRIPT: &str = "text/javascript; charset=utf-8";
    pub const JSON: &str = "application/json";

    pub const OCTET_STREAM: &str = "application/octet-stream";
    pub const WASM: &str = "application/wasm";

    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const GIF: &str = "image/gif";
    pub const SVG: &str = "image/svg+xml";
    pub const ICO: &str = "image/x-icon";
    pub const WEBP: &str = "image/webp";

    pub const WAV: &str = "audio/wav";
    pub const MP3: &str = "audio/mpeg";
    pub const MP4: &str = "video/mp4";

    pub const WOFF: &str = "font/woff";
    pub const WOFF2: &str = "font/woff2";
    pub const TTF: &str = "font/ttf";
    pub const OTF: &str = "font/otf";
    pub const EOT: &str = "application/vnd.ms-fontobject";
}

/// Guess MIME type from file extension.
///
/// Returns a full MIME type string suitable for the Content-Type header.
pub fn from_path(path: &Path) -> &'static str {
    from_extension(path.extension().and_then(|e| e.to_str()))
}

/// Guess MIME type from file extension string.
pub fn from_extension(ext: Option<&str>) -> &'static str {
    match ext {
        Some("html" | "htm") => types::HTML,
        Some("css") => types::CSS,
        Some("js" | "mjs" | "cjs") => types::JAVASCRIPT,
        Some("json" | "map") => types::JSON,
        Some("txt") => types::PLAIN,

        Some("svg") => types::SVG,
        Some("png") => types::PNG,
        Some("jpg" | "jpeg") => types::JPEG,
        Some("gif") => types::GIF,
        Some("webp") => types::WEBP,
        Some("ico") => types::ICO,

        Some("wav") => types::WAV,
        Some("mp3") => types::MP3,
        Some("mp4") => types::MP4,

        Some("woff") => types::WOFF,
        Some("woff2") => types::WOFF2,
        Some("ttf") => types::TTF,
        Some("otf") => types::OTF,
        Some("eot") => types::EOT,

        Some("wasm") => types::WASM,

        _ => types::OCTET_STREAM,
    }
}

/// Check if the MIME type is HTML (injection target).
pub fn is_html(mime: &str) -> bool {
    mime.starts_with("text/html")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_path() {
        assert_eq!(from_path(&PathBuf::from("index.html")), types::HTML);
        assert_eq!(from_path(&PathBuf::from("style.css")), types::CSS);
        assert_eq!(from_path(&PathBuf::from("app.js")), types::JAVASCRIPT);
        assert_eq!(from_path(&PathBuf::from("logo.png")), types::PNG);
        assert_eq!(from_path(&PathBuf::from("unknown.xyz")), types::OCTET_STREAM);
        assert_eq!(from_path(&PathBuf::from("no_extension")), types::OCTET_STREAM);
    }

    #[test]
    fn test_is_html() {
        assert!(is_html(types::HTML));
        assert!(!is_html(types::JAVASCRIPT));
    }
}
