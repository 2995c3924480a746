//! WebSocket listener for the live-update channel.
//!
//! Accepted connections are handed to the WsActor over its channel; the
//! handshake happens there. The acceptor thread stops once shutdown is
//! requested, so no new clients join a server that is going away.

use std::net::{IpAddr, SocketAddr, TcpListener};

use anyhow::{Context, Result};

use crate::actor::messages::WsMsg;

/// Start the listener on the pre-allocated port.
///
/// The port was probed at startup and is baked into the served pages, so a
/// bind failure here is fatal for watch mode rather than retried elsewhere.
pub fn start_ws_listener(
    interface: IpAddr,
    port: u16,
    ws_tx: tokio::sync::mpsc::Sender<WsMsg>,
) -> Result<()> {
    let addr = SocketAddr::new(interface, port);
    let listener = TcpListener::bind(addr)
        .with_context(|| format!("failed to bind update channel on {addr}"))?;
    listener.set_nonblocking(true)?;

    // Spawn acceptor thread
    std::thread::spawn(move || {
        loop {
            if crate::core::is_shutdown() {
                break;
            }
            match listener.accept() {
                Ok((stream, addr)) => {
                    crate::debug!("reload"; "client connected: {}", addr);

                    // Set blocking for the WebSocket handshake
                    let _ = stream.set_nonblocking(false);

                    if ws_tx.blocking_send(WsMsg::AddClient(stream)).is_err() {
                        break;
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
                Err(e) => {
                    crate::log!("reload"; "accept error: {}", e);
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
            }
        }
    });

    Ok(())
}
