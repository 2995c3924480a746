//! Project configuration.
//!
//! Loaded from `hearth.toml` at the project root, with CLI overrides applied
//! on top. Every section falls back to defaults, so a project without a
//! config file still serves.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"   # Network interface (127.0.0.1 = localhost only)
//! port = 3000               # HTTP port number
//! ws_port = 35729           # Live-update WebSocket port
//! watch = true              # Auto-rebuild on file changes
//!
//! [build]
//! source = "src"            # Watched source tree
//! entries = ["src/index.ts"]
//! public = "public"         # HTTP serve root
//! output = "public/dist"    # Bundle output directory
//! ```

mod section;

pub use section::{BuildConfig, ServeConfig};

use crate::cli::{Cli, Commands};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Full development server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DevConfig {
    pub serve: ServeConfig,
    pub build: BuildConfig,

    /// Project root (set from CLI, not from the config file).
    #[serde(skip)]
    root: PathBuf,
}

impl DevConfig {
    /// Load configuration from `<root>/<config>` and apply CLI overrides.
    ///
    /// A missing config file is not an error; defaults are used.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli
            .root
            .canonicalize()
            .with_context(|| format!("project root {} not found", cli.root.display()))?;

        let config_path = root.join(&cli.config);
        let mut config = if config_path.is_file() {
            let text = fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read {}", config_path.display()))?;
            toml::from_str::<Self>(&text)
                .with_context(|| format!("invalid config {}", config_path.display()))?
        } else {
            Self::default()
        };

        config.root = root;
        config.apply_cli(cli);
        Ok(config)
    }

    /// Apply `serve` subcommand overrides.
    fn apply_cli(&mut self, cli: &Cli) {
        if let Commands::Serve {
            interface,
            port,
            ws_port,
            watch,
        } = &cli.command
        {
            if let Some(interface) = interface {
                self.serve.interface = *interface;
            }
            if let Some(port) = port {
                self.serve.port = *port;
            }
            if let Some(ws_port) = ws_port {
                self.serve.ws_port = *ws_port;
            }
            if let Some(watch) = watch {
                self.serve.watch = *watch;
            }
        }
    }

    /// Project root directory (absolute).
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Watched source tree (absolute).
    pub fn source_dir(&self) -> PathBuf {
        self.root.join(&self.build.source)
    }

    /// HTTP serve root (absolute).
    pub fn public_dir(&self) -> PathBuf {
        self.root.join(&self.build.public)
    }

    /// Bundle output directory (absolute).
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.build.output)
    }

    /// Entry points (absolute).
    pub fn entry_paths(&self) -> Vec<PathBuf> {
        self.build.entries.iter().map(|e| self.root.join(e)).collect()
    }

    /// URL prefix of the output directory relative to the serve root.
    ///
    /// `public = "public"`, `output = "public/dist"` → `/dist`.
    /// Falls back to `/` if output is not under public.
    pub fn output_url_prefix(&self) -> String {
        match self.build.output.strip_prefix(&self.build.public) {
            Ok(rel) if rel.as_os_str().is_empty() => String::new(),
            Ok(rel) => {
                let parts: Vec<_> = rel.iter().filter_map(|c| c.to_str()).collect();
                format!("/{}", parts.join("/"))
            }
            Err(_) => String::new(),
        }
    }

    #[cfg(test)]
    pub fn for_tests(root: &Path) -> Self {
        Self {
            serve: ServeConfig::default(),
            build: BuildConfig::default(),
            root: root.to_path_buf(),
        }
    }
}
