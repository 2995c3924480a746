//! Hearth - a development server with hot module reload for browser apps.

mod actor;
mod cli;
mod config;
mod core;
mod embed;
mod error;
mod logger;
mod pipeline;
mod reload;
mod serve;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::DevConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();
    logger::set_verbose(cli.verbose);

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = DevConfig::load(&cli)?;

    match &cli.command {
        Commands::Serve { .. } => serve::run(config),
        Commands::Check { .. } => cli::check::run_check(&config),
    }
}
