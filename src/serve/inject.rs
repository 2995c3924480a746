//! Runtime script injection for served HTML.
//!
//! Every HTML document that passes through the gateway gets the overlay and
//! live-update scripts injected exactly once, so any page of the app joins
//! the update channel without markup changes.

use crate::embed::RUNTIME_DIR;
use crate::utils::mime;

/// The tag pair served documents receive. Overlay loads first so the
/// live-update client can always reach it.
fn script_tags(prefix: &str) -> String {
    format!(
        r#"<script src="{prefix}/{RUNTIME_DIR}/overlay.js"></script><script src="{prefix}/{RUNTIME_DIR}/hmr.js"></script>"#
    )
}

/// Inject the runtime script tags into an HTML body.
///
/// Non-HTML bodies and non-UTF-8 bodies pass through untouched. The tags go
/// immediately before `</head>`, falling back to `</body>`, falling back to
/// appending.
pub fn maybe_inject_runtime(body: Vec<u8>, content_type: &str, prefix: Option<&str>) -> Vec<u8> {
    let Some(prefix) = prefix else {
        return body;
    };
    if !mime::is_html(content_type) {
        return body;
    }
    let html = match String::from_utf8(body) {
        Ok(html) => html,
        Err(e) => return e.into_bytes(),
    };

    let tags = script_tags(prefix);
    let insert_at = html.find("</head>").or_else(|| html.find("</body>"));
    let injected = match insert_at {
        Some(pos) => {
            let mut out = String::with_capacity(html.len() + tags.len());
            out.push_str(&html[..pos]);
            out.push_str(&tags);
            out.push_str(&html[pos..]);
            out
        }
        None => html + &tags,
    };
    injected.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::mime::types::{HTML, JAVASCRIPT};

    fn inject(html: &str) -> String {
        let out = maybe_inject_runtime(html.as_bytes().to_vec(), HTML, Some("/dist"));
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_injects_before_head_close() {
        let out = inject("<html><head><title>t</title></head><body></body></html>");
        let head_close = out.find("</head>").unwrap();
        let script = out.find("<script").unwrap();
        assert!(script < head_close);
        assert!(out.contains(r#"src="/dist/__hearth/overlay.js""#));
        assert!(out.contains(r#"src="/dist/__hearth/hmr.js""#));
    }

    #[test]
    fn test_injects_exactly_once() {
        let out = inject("<html><head></head><body></body></html>");
        assert_eq!(out.matches("hmr.js").count(), 1);
        assert_eq!(out.matches("overlay.js").count(), 1);
    }

    #[test]
    fn test_overlay_loads_before_client() {
        let out = inject("<html><head></head></html>");
        assert!(out.find("overlay.js").unwrap() < out.find("hmr.js").unwrap());
    }

    #[test]
    fn test_headless_document_still_injected() {
        let out = inject("<p>bare fragment</p>");
        assert!(out.contains("hmr.js"));
    }

    #[test]
    fn test_non_html_untouched() {
        let body = b"console.log(1)".to_vec();
        let out = maybe_inject_runtime(body.clone(), JAVASCRIPT, Some("/dist"));
        assert_eq!(out, body);
    }

    #[test]
    fn test_no_prefix_means_no_injection() {
        let body = b"<html><head></head></html>".to_vec();
        let out = maybe_inject_runtime(body.clone(), HTML, None);
        assert_eq!(out, body);
    }
}
