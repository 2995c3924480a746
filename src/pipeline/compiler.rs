//! External compiler seam.
//!
//! Non-CSS modules pass through a compiler collaborator: the pipeline only
//! invokes it and collects diagnostics. The default implementation parses
//! the source with oxc to surface syntax errors and otherwise emits the
//! text unmodified (this is a development server; output fidelity beyond
//! syntax checking belongs to a production bundler).

use std::fmt;
use std::path::Path;

use oxc::allocator::Allocator;
use oxc::parser::Parser;
use oxc::span::SourceType;

/// One build diagnostic. An ordered, non-empty list of these constitutes a
/// failed build.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Source path the diagnostic points at (module id form)
    pub path: String,
    /// Human-readable message, with `line:col` when known
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Join diagnostics into one text block, one per line. This is the exact
/// text shown in the terminal and in the browser error overlay.
pub fn render_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Compiler collaborator contract: given a source file, return either the
/// compiled text or the diagnostics that prevented compilation.
pub trait ModuleCompiler: Send {
    fn compile(&mut self, path: &Path, id: &str, source: &str) -> Result<String, Vec<Diagnostic>>;
}

/// Default compiler: oxc syntax check, passthrough output.
pub struct SyntaxCheckCompiler;

impl ModuleCompiler for SyntaxCheckCompiler {
    fn compile(&mut self, path: &Path, id: &str, source: &str) -> Result<String, Vec<Diagnostic>> {
        let allocator = Allocator::default();
        let source_type = SourceType::from_path(path).unwrap_or_else(|_| SourceType::mjs());

        let ret = Parser::new(&allocator, source, source_type).parse();
        if ret.errors.is_empty() {
            return Ok(source.to_string());
        }

        let diagnostics = ret
            .errors
            .iter()
            .map(|e| {
                let location = e
                    .labels
                    .as_ref()
                    .and_then(|labels| labels.first())
                    .map(|label| line_col(source, label.offset()));
                let message = match location {
                    Some((line, col)) => format!("{line}:{col} {}", e.message),
                    None => e.message.to_string(),
                };
                Diagnostic {
                    path: id.to_string(),
                    message,
                }
            })
            .collect();
        Err(diagnostics)
    }
}

/// 1-based line and column for a byte offset.
fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let prefix = &source[..offset.min(source.len())];
    let line = prefix.matches('\n').count() + 1;
    let col = prefix
        .rfind('\n')
        .map(|pos| prefix.len() - pos)
        .unwrap_or(prefix.len() + 1);
    (line, col)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_source_passes_through() {
        let mut compiler = SyntaxCheckCompiler;
        let source = "export const answer = 42;\n";
        let out = compiler
            .compile(&PathBuf::from("src/index.ts"), "src/index.ts", source)
            .expect("valid module should compile");
        assert_eq!(out, source);
    }

    #[test]
    fn test_syntax_error_yields_diagnostics() {
        let mut compiler = SyntaxCheckCompiler;
        let err = compiler
            .compile(
                &PathBuf::from("src/broken.js"),
                "src/broken.js",
                "const = 1;\n",
            )
            .expect_err("broken module should fail");
        assert!(!err.is_empty());
        assert_eq!(err[0].path, "src/broken.js");
    }

    #[test]
    fn test_line_col() {
        assert_eq!(line_col("abc", 0), (1, 1));
        assert_eq!(line_col("a\nbc", 2), (2, 1));
        assert_eq!(line_col("a\nbc", 3), (2, 2));
    }
}
