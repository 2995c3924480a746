//! Path normalization utilities.
//!
//! Pure functions, no filesystem access except where noted.

use std::path::{Component, Path, PathBuf};

/// Normalize a path lexically: drop `.` components, resolve `..` against
/// preceding components, keep the result platform-native.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Module id for a source file: its path relative to the project root,
/// normalized with forward slashes.
///
/// Falls back to the full normalized path when the file is outside the root.
pub fn module_id(path: &Path, root: &Path) -> String {
    let normalized = normalize_path(path);
    let rel = normalized.strip_prefix(root).unwrap_or(&normalized);
    let parts: Vec<_> = rel.iter().filter_map(|c| c.to_str()).collect();
    parts.join("/")
}

/// File extension as a lowercase string, if any.
pub fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_drops_curdir() {
        assert_eq!(
            normalize_path(Path::new("a/./b/./c")),
            PathBuf::from("a/b/c")
        );
    }

    #[test]
    fn test_normalize_resolves_parent() {
        assert_eq!(normalize_path(Path::new("a/b/../c")), PathBuf::from("a/c"));
        assert_eq!(normalize_path(Path::new("../x")), PathBuf::from("../x"));
    }

    #[test]
    fn test_module_id_relative_to_root() {
        let root = Path::new("/proj");
        assert_eq!(
            module_id(Path::new("/proj/src/app.module.css"), root),
            "src/app.module.css"
        );
    }

    #[test]
    fn test_module_id_outside_root() {
        let root = Path::new("/proj");
        assert_eq!(module_id(Path::new("/other/x.ts"), root), "/other/x.ts");
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension(Path::new("a/b.Module.CSS")), Some("css".into()));
        assert_eq!(extension(Path::new("a/b")), None);
    }
}
