//! `[serve]` and `[build]` section configuration.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::Deserialize;

/// Development server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number. The allocator probes upward from here on conflict.
    pub port: u16,

    /// Live-update WebSocket port, probed independently of the HTTP port.
    pub ws_port: u16,

    /// Enable file watcher for live reload.
    pub watch: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 3000,
            ws_port: 35729,
            watch: true,
        }
    }
}

/// Build pipeline settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Watched source tree, relative to the project root.
    pub source: PathBuf,

    /// Bundle entry points, relative to the project root.
    pub entries: Vec<PathBuf>,

    /// HTTP serve root, relative to the project root.
    pub public: PathBuf,

    /// Bundle output directory, relative to the project root.
    /// Normally nested under `public` so outputs are served directly.
    pub output: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("src"),
            entries: vec![PathBuf::from("src/index.ts")],
            public: PathBuf::from("public"),
            output: PathBuf::from("public/dist"),
        }
    }
}
