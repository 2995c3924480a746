//! CSS Modules transform.
//!
//! A stylesheet named `*.module.css` gets file-scoped class names: every
//! class selector is rewritten to `<name>_<hash8>` where the hash is derived
//! from the module id and the original name. The derivation is
//! deterministic, so a name is stable for the lifetime of the process (and
//! across restarts), and two distinct files can never collide on the same
//! generated name within a build.
//!
//! Plain stylesheets are injected verbatim; their selectors stay global.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

/// Original selector name → generated unique name, for one CSS-module file.
pub type ClassNameMapping = BTreeMap<String, String>;

/// Class selector token: `.name` where name is a CSS identifier.
static CLASS_SELECTOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(-?[a-zA-Z_][a-zA-Z0-9_-]*)").expect("valid regex"));

/// Grouping at-rules whose body is still selector context.
const GROUPING_AT_RULES: [&str; 4] = ["@media", "@supports", "@container", "@layer"];

/// Check whether a path carries the "isolated" designation.
pub fn is_css_module(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".module.css"))
}

/// Generated replacement for one class name of one module.
fn scoped_class_name(module_id: &str, name: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(module_id.as_bytes());
    hasher.update(b"\0");
    hasher.update(name.as_bytes());
    let digest = hasher.finalize();
    format!("{}_{}", name, &hex::encode(&digest.as_bytes()[..4]))
}

/// Block kind on the nesting stack.
#[derive(Clone, Copy, PartialEq)]
enum Block {
    /// Grouping at-rule body: contents are still selector context
    Group,
    /// Style rule body: declarations, copied verbatim
    Rule,
}

/// Rewrite every class selector of a CSS-module file.
///
/// Returns the rewritten stylesheet and the name mapping. Only selector
/// positions are rewritten (including inside grouping at-rules such as
/// `@media`), so property values like `url(icon.png)` are left alone.
pub fn transform(module_id: &str, css: &str) -> (String, ClassNameMapping) {
    let mut mapping = ClassNameMapping::new();
    let mut out = String::with_capacity(css.len());
    let mut selector = String::new();
    let mut stack: Vec<Block> = Vec::new();

    let in_selector_context = |stack: &[Block]| stack.iter().all(|b| *b == Block::Group);

    for c in css.chars() {
        match c {
            '{' if in_selector_context(&stack) => {
                let block = if is_grouping_at_rule(&selector) {
                    Block::Group
                } else {
                    Block::Rule
                };
                out.push_str(&rewrite_segment(module_id, &selector, &mut mapping));
                selector.clear();
                stack.push(block);
                out.push(c);
            }
            '{' => {
                stack.push(Block::Rule);
                out.push(c);
            }
            '}' => {
                if in_selector_context(&stack) {
                    // Flush pending selector text before closing a group
                    out.push_str(&rewrite_segment(module_id, &selector, &mut mapping));
                    selector.clear();
                }
                stack.pop();
                out.push(c);
            }
            _ if in_selector_context(&stack) => selector.push(c),
            _ => out.push(c),
        }
    }
    // Trailing selector text without a block (malformed css) passes through
    out.push_str(&rewrite_segment(module_id, &selector, &mut mapping));

    (out, mapping)
}

/// Check whether a pending selector segment opens a grouping at-rule.
fn is_grouping_at_rule(selector: &str) -> bool {
    let trimmed = selector.trim_start();
    GROUPING_AT_RULES
        .iter()
        .any(|rule| trimmed.starts_with(rule))
}

/// Injectable loader code for a stylesheet module.
///
/// The emitted module creates or updates a `<style>` element keyed by the
/// module id, registers the module with the client runtime as
/// hot-acceptable, and (for CSS modules) exports the class-name mapping.
pub fn loader_code(module_id: &str, css: &str, mapping: Option<&ClassNameMapping>) -> String {
    let id_json = serde_json::to_string(module_id).unwrap_or_default();
    let css_json = serde_json::to_string(css).unwrap_or_default();

    let mut code = format!(
        "const id = {id_json};\n\
         const css = {css_json};\n\
         let el = document.querySelector(`style[data-hearth-id=\"${{id}}\"]`);\n\
         if (!el) {{\n\
         \x20 el = document.createElement(\"style\");\n\
         \x20 el.setAttribute(\"data-hearth-id\", id);\n\
         \x20 document.head.appendChild(el);\n\
         }}\n\
         el.textContent = css;\n\
         if (window.__hearth__) window.__hearth__.accept(id);\n"
    );
    if let Some(mapping) = mapping {
        let mapping_json = serde_json::to_string(mapping).unwrap_or_else(|_| "{}".into());
        code.push_str(&format!("export default {mapping_json};\n"));
    }
    code
}

/// Rewrite class tokens within one selector segment.
///
/// Quoted strings (attribute selector values like `[href$=".css"]`) are
/// copied verbatim; only the unquoted parts are class-selector context.
fn rewrite_segment(module_id: &str, segment: &str, mapping: &mut ClassNameMapping) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut rest = segment;

    while let Some(open) = rest.find(['"', '\'']) {
        let quote = rest.as_bytes()[open] as char;
        out.push_str(&rewrite_classes(module_id, &rest[..open], mapping));
        match rest[open + 1..].find(quote) {
            Some(close) => {
                let end = open + 1 + close + 1;
                out.push_str(&rest[open..end]);
                rest = &rest[end..];
            }
            None => {
                // Unterminated string, pass the tail through
                out.push_str(&rest[open..]);
                return out;
            }
        }
    }
    out.push_str(&rewrite_classes(module_id, rest, mapping));
    out
}

fn rewrite_classes(module_id: &str, text: &str, mapping: &mut ClassNameMapping) -> String {
    CLASS_SELECTOR
        .replace_all(text, |caps: &regex::Captures| {
            let name = &caps[1];
            let generated = mapping
                .entry(name.to_string())
                .or_insert_with(|| scoped_class_name(module_id, name));
            format!(".{generated}")
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_is_css_module() {
        assert!(is_css_module(&PathBuf::from("src/app.module.css")));
        assert!(!is_css_module(&PathBuf::from("src/app.css")));
        assert!(!is_css_module(&PathBuf::from("src/module.css")));
    }

    #[test]
    fn test_rewrites_every_occurrence_consistently() {
        let css = ".box{color:red}.box:hover{color:blue}";
        let (out, mapping) = transform("src/app.module.css", css);

        let generated = mapping.get("box").expect("box should be mapped");
        assert_ne!(generated, "box");
        assert_eq!(out.matches(generated.as_str()).count(), 2);
        assert!(!out.contains(".box{"));
    }

    #[test]
    fn test_mapping_is_bijective() {
        let css = ".a{}.b{}.c{}";
        let (_, mapping) = transform("m.module.css", css);
        assert_eq!(mapping.len(), 3);

        let mut generated: Vec<_> = mapping.values().collect();
        generated.sort();
        generated.dedup();
        assert_eq!(generated.len(), 3, "no two names may collide");
    }

    #[test]
    fn test_distinct_files_get_distinct_names() {
        let (_, a) = transform("a.module.css", ".box{color:red}");
        let (_, b) = transform("b.module.css", ".box{color:red}");
        assert_ne!(a.get("box"), b.get("box"));
    }

    #[test]
    fn test_deterministic_across_runs() {
        let (_, first) = transform("a.module.css", ".box{}");
        let (_, second) = transform("a.module.css", ".box{}");
        assert_eq!(first, second);
    }

    #[test]
    fn test_declaration_values_untouched() {
        let css = ".icon{background:url(sprite.png)}";
        let (out, mapping) = transform("m.module.css", css);
        assert!(out.contains("url(sprite.png)"));
        assert_eq!(mapping.len(), 1);
        assert!(mapping.contains_key("icon"));
    }

    #[test]
    fn test_media_query_selectors_rewritten() {
        let css = ".box{color:red}@media (min-width:600px){.box{color:blue}}";
        let (out, mapping) = transform("m.module.css", css);
        assert_eq!(mapping.len(), 1);

        let generated = &mapping["box"];
        // Same generated name inside and outside the media query
        assert_eq!(out.matches(generated.as_str()).count(), 2);
        assert!(out.contains("min-width:600px"));
    }

    #[test]
    fn test_loader_code_for_module() {
        let (out, mapping) = transform("src/app.module.css", ".box{color:red}");
        let code = loader_code("src/app.module.css", &out, Some(&mapping));

        assert!(code.contains(r#""src/app.module.css""#));
        assert!(code.contains("export default"));
        assert!(code.contains(&mapping["box"]));
        assert!(code.contains("window.__hearth__"));
    }

    #[test]
    fn test_loader_code_plain_css_has_no_export() {
        let code = loader_code("src/global.css", "body{margin:0}", None);
        assert!(!code.contains("export default"));
        assert!(code.contains("body{margin:0}"));
    }

    #[test]
    fn test_attribute_selector_strings_untouched() {
        let css = r#".link[href$=".css"]{color:red}"#;
        let (out, mapping) = transform("m.module.css", css);

        assert_eq!(mapping.len(), 1, "only .link is a class selector");
        assert!(out.contains(r#"[href$=".css"]"#));
        assert!(out.contains(&mapping["link"]));
    }

    #[test]
    fn test_combined_selectors() {
        let css = ".a .b,.c>.a{margin:0}";
        let (out, mapping) = transform("m.module.css", css);
        assert_eq!(mapping.len(), 3);
        let a = &mapping["a"];
        assert_eq!(out.matches(a.as_str()).count(), 2);
    }
}
