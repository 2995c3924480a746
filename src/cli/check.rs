//! One-shot build check.
//!
//! Runs the full build once, prints every diagnostic, and exits non-zero on
//! failure. Useful in scripts and CI where the server itself is not wanted.

use anyhow::Result;

use crate::config::DevConfig;
use crate::log;
use crate::pipeline::{AssetPipeline, BuildResult, SyntaxCheckCompiler};

pub fn run_check(config: &DevConfig) -> Result<()> {
    let mut pipeline = AssetPipeline::new(config, Box::new(SyntaxCheckCompiler))?;

    match pipeline.build_all() {
        BuildResult::Success { changed, .. } => {
            log!("build"; "{} modules built", changed.len());
            Ok(())
        }
        BuildResult::Failure { diagnostics } => {
            for diagnostic in &diagnostics {
                log!("error"; "{}", diagnostic);
            }
            anyhow::bail!("build failed with {} error(s)", diagnostics.len())
        }
    }
}
