//! Typed startup errors.
//!
//! Everything that happens after startup is recoverable and stays inside its
//! boundary: build failures become error broadcasts, request failures become
//! HTTP statuses, connection failures remove the connection. Only the
//! conditions below abort the process.

use std::path::PathBuf;

use thiserror::Error;

/// Unrecoverable startup conditions. Each aborts with a non-zero exit.
#[derive(Debug, Error)]
pub enum StartupError {
    /// No free port found within the probe ceiling.
    #[error("no free port in range {start}..{end}")]
    NoFreePort { start: u16, end: u16 },

    /// Output directory could not be created.
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Source directory does not exist.
    #[error("source directory {0} does not exist")]
    MissingSourceDir(PathBuf),
}
