//! Asset pipeline.
//!
//! Owns the incremental build context: the entry points, the published
//! module registry, and the compiler collaborator. A rebuild runs as an
//! explicit pipeline of stages - compile every changed file, then one
//! completion step that either publishes the whole batch or publishes
//! nothing:
//!
//! ```text
//! changes -> compile stage -> completion -> BuildResult
//!                               |  success: write outputs, update registry
//!                               |  failure: diagnostics only, registry untouched
//! ```
//!
//! Rebuild serialization is structural: the pipeline is owned by a single
//! build actor, so two rebuilds can never interleave on one build context.

pub mod compiler;
pub mod css;

pub use compiler::{Diagnostic, ModuleCompiler, SyntaxCheckCompiler, render_diagnostics};
pub use css::ClassNameMapping;

use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::config::DevConfig;
use crate::error::StartupError;
use crate::utils::path::{extension, module_id, normalize_path};

/// Source extensions the pipeline knows how to build.
const SOURCE_EXTENSIONS: [&str; 7] = ["js", "mjs", "cjs", "jsx", "ts", "tsx", "css"];

/// Kind of filesystem change feeding a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// One built module. Replaced wholesale on every successful rebuild that
/// touches its path.
#[derive(Debug, Clone)]
pub struct Module {
    /// Normalized source path relative to the project root
    pub id: String,
    /// Compiled code text (what gets written to the output directory)
    pub code: String,
    /// Compiled stylesheet text, for style-carrying modules
    pub style: Option<String>,
    /// Class-name mapping, for CSS modules
    pub mapping: Option<ClassNameMapping>,
    /// Whether the module can take a hot patch in place
    pub hot_accept: bool,
}

/// Outcome of one completed rebuild: either a non-empty list of diagnostics
/// or the delta of modules that changed in this pass - never both.
#[derive(Debug)]
pub enum BuildResult {
    Success {
        /// Modules created or replaced in this pass (the delta, not the full set)
        changed: Vec<Module>,
        /// Module ids whose source files were deleted
        removed: Vec<String>,
        /// Whether every change can be applied in place by connected clients.
        /// True only when nothing was removed, every changed module accepts
        /// hot patches, and no class-name mapping differs from the previously
        /// published version of the same module.
        hot_patch: bool,
    },
    Failure {
        /// Ordered diagnostics; guaranteed non-empty
        diagnostics: Vec<Diagnostic>,
    },
}

impl BuildResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Incremental build context over a fixed set of entry points.
pub struct AssetPipeline {
    root: PathBuf,
    source_dir: PathBuf,
    output_dir: PathBuf,
    entries: Vec<PathBuf>,
    compiler: Box<dyn ModuleCompiler>,
    /// Published modules by id. Only touched by successful rebuilds.
    modules: FxHashMap<String, Module>,
}

impl AssetPipeline {
    /// Create the build context. Fails fast when the source tree is missing
    /// or the output directory cannot be created.
    pub fn new(config: &DevConfig, compiler: Box<dyn ModuleCompiler>) -> Result<Self, StartupError> {
        let source_dir = config.source_dir();
        if !source_dir.is_dir() {
            return Err(StartupError::MissingSourceDir(source_dir));
        }

        let output_dir = config.output_dir();
        fs::create_dir_all(&output_dir).map_err(|source| StartupError::OutputDir {
            path: output_dir.clone(),
            source,
        })?;

        Ok(Self {
            root: config.root().to_path_buf(),
            source_dir,
            output_dir,
            entries: config.entry_paths(),
            compiler,
            modules: FxHashMap::default(),
        })
    }

    /// Initial full build: every eligible file under the source tree.
    ///
    /// Missing entry points are diagnostics, not panics - the watcher can
    /// pick them up once they appear.
    pub fn build_all(&mut self) -> BuildResult {
        let mut diagnostics = Vec::new();
        for entry in &self.entries {
            if !entry.is_file() {
                diagnostics.push(Diagnostic {
                    path: module_id(entry, &self.root),
                    message: "entry point not found".to_string(),
                });
            }
        }
        if !diagnostics.is_empty() {
            return BuildResult::Failure { diagnostics };
        }

        let mut files = Vec::new();
        collect_source_files(&self.source_dir, &mut files);
        files.sort();
        self.compile_batch(files, Vec::new())
    }

    /// Incremental rebuild from a debounced batch of filesystem changes.
    pub fn rebuild(&mut self, changes: &[(PathBuf, ChangeKind)]) -> BuildResult {
        let mut compile = Vec::new();
        let mut removed = Vec::new();

        for (path, kind) in changes {
            let path = normalize_path(path);
            if !self.is_source_file(&path) {
                continue;
            }
            match kind {
                ChangeKind::Removed => {
                    let id = module_id(&path, &self.root);
                    if self.modules.remove(&id).is_some() {
                        let _ = fs::remove_file(self.output_path(&path));
                        removed.push(id);
                    }
                }
                ChangeKind::Created | ChangeKind::Modified => compile.push(path),
            }
        }

        compile.sort();
        compile.dedup();
        self.compile_batch(compile, removed)
    }

    /// Published module by id.
    pub fn module(&self, id: &str) -> Option<&Module> {
        self.modules.get(id)
    }

    /// Compile a batch, then run the completion step: publish everything or
    /// nothing.
    fn compile_batch(&mut self, paths: Vec<PathBuf>, removed: Vec<String>) -> BuildResult {
        let mut staged = Vec::new();
        let mut diagnostics = Vec::new();

        for path in &paths {
            match self.compile_one(path) {
                Ok(module) => staged.push(module),
                Err(mut errs) => diagnostics.append(&mut errs),
            }
        }

        // Completion step: a failed rebuild publishes no module at all
        if !diagnostics.is_empty() {
            return BuildResult::Failure { diagnostics };
        }

        // Decided against the registry as it stood before this batch: a
        // module is only patchable in place when its previous version exists
        // and its class-name mapping is unchanged
        let hot_patch = removed.is_empty()
            && !staged.is_empty()
            && staged.iter().all(|m| {
                m.hot_accept
                    && self
                        .modules
                        .get(&m.id)
                        .is_some_and(|prev| prev.mapping == m.mapping)
            });

        // Stage every output to a temp sibling first, then rename the lot.
        // A write failure mid-batch leaves previously published files alone.
        let mut written = Vec::with_capacity(staged.len());
        for (module, path) in staged.iter().zip(&paths) {
            match self.stage_output(path, &module.code) {
                Ok(tmp) => written.push(tmp),
                Err(e) => {
                    for tmp in &written {
                        let _ = fs::remove_file(tmp);
                    }
                    return BuildResult::Failure {
                        diagnostics: vec![Diagnostic {
                            path: module.id.clone(),
                            message: format!("failed to write output: {e}"),
                        }],
                    };
                }
            }
        }
        for (tmp, path) in written.iter().zip(&paths) {
            if let Err(e) = fs::rename(tmp, self.output_path(path)) {
                for tmp in &written {
                    let _ = fs::remove_file(tmp);
                }
                return BuildResult::Failure {
                    diagnostics: vec![Diagnostic {
                        path: module_id(path, &self.root),
                        message: format!("failed to write output: {e}"),
                    }],
                };
            }
        }
        for module in &staged {
            self.modules.insert(module.id.clone(), module.clone());
        }

        BuildResult::Success {
            changed: staged,
            removed,
            hot_patch,
        }
    }

    /// Compile a single source file into a staged module.
    fn compile_one(&mut self, path: &Path) -> Result<Module, Vec<Diagnostic>> {
        let id = module_id(path, &self.root);
        let source = fs::read_to_string(path).map_err(|e| {
            vec![Diagnostic {
                path: id.clone(),
                message: format!("failed to read source: {e}"),
            }]
        })?;

        if css::is_css_module(path) {
            let (rewritten, mapping) = css::transform(&id, &source);
            let code = css::loader_code(&id, &rewritten, Some(&mapping));
            return Ok(Module {
                id,
                code,
                style: Some(rewritten),
                mapping: Some(mapping),
                hot_accept: true,
            });
        }

        if extension(path).as_deref() == Some("css") {
            // Plain stylesheet: injected verbatim, selectors stay global
            let code = css::loader_code(&id, &source, None);
            return Ok(Module {
                id,
                code,
                style: Some(source),
                mapping: None,
                hot_accept: true,
            });
        }

        let code = self.compiler.compile(path, &id, &source)?;
        Ok(Module {
            id,
            code,
            style: None,
            mapping: None,
            hot_accept: false,
        })
    }

    /// Output location for a source file: its path relative to the source
    /// tree, mirrored under the output directory. Stylesheets become `.js`
    /// loader modules.
    fn output_path(&self, source: &Path) -> PathBuf {
        let rel = source.strip_prefix(&self.source_dir).unwrap_or(source);
        let mut out = self.output_dir.join(rel);
        if extension(source).as_deref() == Some("css") {
            let name = format!(
                "{}.js",
                out.file_name().and_then(|n| n.to_str()).unwrap_or("module")
            );
            out.set_file_name(name);
        }
        out
    }

    /// Write a module's output to a temp sibling of its final location.
    fn stage_output(&self, source: &Path, code: &str) -> std::io::Result<PathBuf> {
        let out = self.output_path(source);
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)?;
        }
        let name = out.file_name().and_then(|n| n.to_str()).unwrap_or("module");
        let tmp = out.with_file_name(format!("{name}.tmp"));
        fs::write(&tmp, code)?;
        Ok(tmp)
    }

    fn is_source_file(&self, path: &Path) -> bool {
        path.starts_with(&self.source_dir)
            && extension(path)
                .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext.as_str()))
    }
}

/// Recursively collect buildable files under a directory.
fn collect_source_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_dir() {
            collect_source_files(&path, out);
        } else if extension(&path).is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext.as_str())) {
            out.push(normalize_path(&path));
        }
    }
}
