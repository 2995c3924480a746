//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Hearth development server CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project root directory
    #[arg(short, long, default_value = ".", value_hint = clap::ValueHint::DirPath)]
    pub root: PathBuf,

    /// Config file path (relative to project root)
    #[arg(short = 'C', long, default_value = "hearth.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start development server with hot module reload
    #[command(visible_alias = "s")]
    Serve {
        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<std::net::IpAddr>,

        /// HTTP port number to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// WebSocket port for live updates
        #[arg(long)]
        ws_port: Option<u16>,

        /// Enable file watching for auto-rebuild
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        watch: Option<bool>,
    },

    /// Build entry points once and report diagnostics
    #[command(visible_alias = "c")]
    Check {},
}
