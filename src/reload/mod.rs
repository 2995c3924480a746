//! Live-update wire protocol.

pub mod message;
pub mod server;

pub use message::{ModulePatch, UpdateMessage};
