//! Actor system for watch mode.
//!
//! Message-passing concurrency for the rebuild loop:
//!
//! ```text
//! FsActor --> BuildActor --> WsActor
//! (watch)     (pipeline)    (broadcast)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - File system watcher with debouncing
//! - `build` - Asset pipeline ownership and update decisions
//! - `ws` - WebSocket broadcast
//! - `coordinator` - Wires up and runs actors

pub mod build;
pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod ws;

pub use coordinator::{Coordinator, WatchHandles};
