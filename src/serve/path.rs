//! URL to filesystem path resolution.

use std::path::{Path, PathBuf};

/// Resolve URL to filesystem path, handling index.html for directories.
pub fn resolve_path(url: &str, serve_root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url)?;

    // Reject paths with suspicious patterns early
    if clean.contains("..") {
        return None;
    }

    let local = serve_root.join(&clean);

    // Canonicalize to resolve symlinks and verify the path is under the
    // serve root. This prevents traversal via symlinks or encoded sequences.
    let canonical = local.canonicalize().ok()?;
    let root_canonical = serve_root.canonicalize().ok()?;

    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    if canonical.is_dir() {
        let index = canonical.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }

    None
}

/// Normalize URL: strip query string, decode, trim slashes.
///
/// The query is split off before percent-decoding so an encoded `%3F` in a
/// filename stays part of the path. Sequences that do not decode to valid
/// UTF-8 name nothing on disk and resolve to `None`.
fn normalize_url(url: &str) -> Option<String> {
    use percent_encoding::percent_decode_str;
    let path = url.split('?').next().unwrap_or(url);
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    Some(decoded.trim_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        fs::create_dir(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("assets/app.js"), "1").unwrap();
        dir
    }

    #[test]
    fn test_root_serves_index() {
        let dir = fixture();
        let resolved = resolve_path("/", dir.path()).unwrap();
        assert!(resolved.ends_with("index.html"));
    }

    #[test]
    fn test_file_path() {
        let dir = fixture();
        let resolved = resolve_path("/assets/app.js", dir.path()).unwrap();
        assert!(resolved.ends_with("assets/app.js"));
    }

    #[test]
    fn test_query_string_stripped() {
        let dir = fixture();
        assert!(resolve_path("/assets/app.js?v=2", dir.path()).is_some());
    }

    #[test]
    fn test_traversal_rejected() {
        let dir = fixture();
        assert!(resolve_path("/../secret", dir.path()).is_none());
        assert!(resolve_path("/%2e%2e/secret", dir.path()).is_none());
    }

    #[test]
    fn test_encoded_question_mark_is_path_not_query() {
        let dir = fixture();
        fs::write(dir.path().join("q?.txt"), "1").unwrap();
        let resolved = resolve_path("/q%3F.txt", dir.path()).unwrap();
        assert!(resolved.ends_with("q?.txt"));
    }

    #[test]
    fn test_invalid_utf8_escape_is_none() {
        let dir = fixture();
        // Must not fall back to the empty path (which would serve the index)
        assert!(resolve_path("/%FF%FE", dir.path()).is_none());
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = fixture();
        assert!(resolve_path("/nope.html", dir.path()).is_none());
    }
}
