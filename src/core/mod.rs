//! Process-wide lifecycle state.

mod state;

pub use state::{is_shutdown, register_server, setup_shutdown_handler};
