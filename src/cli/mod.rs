//! Command-line interface.

mod args;
pub mod check;

pub use args::{Cli, Commands};
