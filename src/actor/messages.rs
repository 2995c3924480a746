//! Actor message definitions.
//!
//! ```text
//! FsActor --Changes--> BuildActor --Broadcast--> WsActor
//! ```

use std::net::TcpStream;
use std::path::PathBuf;

use crate::pipeline::ChangeKind;
use crate::reload::UpdateMessage;

/// Messages to the build actor.
#[derive(Debug)]
pub enum BuildMsg {
    /// Debounced batch of filesystem changes
    Changes(Vec<(PathBuf, ChangeKind)>),
    /// Shutdown (dispose the build context)
    Shutdown,
}

/// Messages to the WebSocket actor.
pub enum WsMsg {
    /// Broadcast an update to every connected client
    Broadcast(UpdateMessage),
    /// Add client
    AddClient(TcpStream),
    /// Shutdown (close all client connections)
    Shutdown,
}
