//! WebSocket Actor
//!
//! This actor is responsible for:
//! - Managing WebSocket client connections
//! - Broadcasting update messages to all connected clients
//! - Replaying the last build error to clients that connect mid-failure
//!
//! ```text
//! BuildActor --[Broadcast]--> WsActor --> Clients
//! ```

use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::messages::WsMsg;
use crate::reload::UpdateMessage;

/// A client that opens a socket but never finishes the WebSocket handshake
/// gets cut off after this long, so it cannot hold up the actor mailbox.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(2);

/// WebSocket Actor - manages client connections and broadcasts
pub struct WsActor {
    /// Channel to receive messages
    rx: mpsc::Receiver<WsMsg>,
    /// Connected clients (shared for broadcast + read threads)
    clients: Arc<Mutex<Vec<WebSocket<TcpStream>>>>,
    /// Last broadcast build error, replayed to clients that connect before
    /// the next successful build
    pending_error: Arc<Mutex<Option<String>>>,
}

impl WsActor {
    pub fn new(rx: mpsc::Receiver<WsMsg>) -> Self {
        Self {
            rx,
            clients: Arc::new(Mutex::new(Vec::new())),
            pending_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Seed the pending error (initial build failed before any client connected).
    pub fn with_pending_error(self, error: String) -> Self {
        *self.pending_error.lock() = Some(error);
        self
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        // Spawn a background thread to poll for client-initiated closes
        let clients_for_reader = Arc::clone(&self.clients);
        std::thread::spawn(move || {
            Self::client_reader_loop(clients_for_reader);
        });

        while let Some(msg) = self.rx.recv().await {
            match msg {
                WsMsg::Broadcast(update) => {
                    // An error sticks around for late joiners; any successful
                    // update clears it
                    match &update {
                        UpdateMessage::Error { error } => {
                            *self.pending_error.lock() = Some(error.clone());
                        }
                        _ => *self.pending_error.lock() = None,
                    }
                    self.broadcast(Message::Text(update.to_json().into()));
                }

                WsMsg::AddClient(stream) => {
                    self.add_client(stream);
                }

                WsMsg::Shutdown => {
                    crate::debug!("ws"; "shutting down");
                    let mut clients = self.clients.lock();
                    for mut client in clients.drain(..) {
                        let _ = client.close(None);
                    }
                    break;
                }
            }
        }
    }

    /// Send a message to every client, dropping the ones that fail.
    fn broadcast(&self, message: Message) {
        let mut clients = self.clients.lock();
        clients.retain_mut(|ws| ws.send(message.clone()).is_ok());
        crate::debug!("ws"; "broadcast to {} clients", clients.len());
    }

    /// Add a new client connection
    fn add_client(&self, stream: TcpStream) {
        // Blocking mode during the handshake, but bounded: a stalled peer
        // times out instead of wedging the actor loop
        let _ = stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT));
        match tungstenite::accept(stream) {
            Ok(mut ws) => {
                // Replay the pending error so a page opened mid-failure shows
                // the overlay immediately
                if let Some(ref error) = *self.pending_error.lock() {
                    let msg = UpdateMessage::error(error.clone());
                    if let Err(e) = ws.send(Message::Text(msg.to_json().into())) {
                        crate::log!("ws"; "failed to send pending error: {}", e);
                        return;
                    }
                    crate::debug!("ws"; "sent pending error to new client");
                }

                // Now set non-blocking for polling reads
                let _ = ws.get_ref().set_nonblocking(true);

                let mut clients = self.clients.lock();
                clients.push(ws);
                crate::debug!("ws"; "client connected (total: {})", clients.len());
            }
            Err(e) => {
                crate::log!("ws"; "handshake failed: {}", e);
            }
        }
    }

    /// Background thread to detect client disconnects (non-blocking poll)
    fn client_reader_loop(clients: Arc<Mutex<Vec<WebSocket<TcpStream>>>>) {
        loop {
            std::thread::sleep(std::time::Duration::from_millis(100));
            if crate::core::is_shutdown() {
                break;
            }

            let mut guard = clients.lock();
            guard.retain_mut(|ws| match ws.read() {
                Ok(Message::Close(_)) => false,
                Ok(_) => true,
                Err(tungstenite::Error::Io(ref e))
                    if e.kind() == std::io::ErrorKind::WouldBlock =>
                {
                    true
                }
                Err(_) => false,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    /// Run a WsActor on its own thread with a single-threaded runtime.
    fn run_actor(
        pending_error: Option<String>,
    ) -> (mpsc::Sender<WsMsg>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(8);
        let handle = std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let actor = match pending_error {
                Some(error) => WsActor::new(rx).with_pending_error(error),
                None => WsActor::new(rx),
            };
            rt.block_on(actor.run());
        });
        (tx, handle)
    }

    /// Connect a real client through a local listener and register its
    /// server side with the actor.
    fn connect_client(
        listener: &TcpListener,
        tx: &mpsc::Sender<WsMsg>,
    ) -> WebSocket<TcpStream> {
        let addr = listener.local_addr().unwrap();
        let client_stream = TcpStream::connect(addr).unwrap();
        let (server_stream, _) = listener.accept().unwrap();
        tx.blocking_send(WsMsg::AddClient(server_stream)).unwrap();

        client_stream
            .set_read_timeout(Some(Duration::from_secs(10)))
            .unwrap();
        let (ws, _) =
            tungstenite::client(format!("ws://{addr}/"), client_stream).unwrap();
        ws
    }

    fn recv_text(ws: &mut WebSocket<TcpStream>) -> String {
        loop {
            match ws.read().unwrap() {
                Message::Text(text) => return text.to_string(),
                Message::Ping(_) | Message::Pong(_) => continue,
                other => panic!("expected text frame, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_broadcast_reaches_connected_clients() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let (tx, handle) = run_actor(None);

        let mut a = connect_client(&listener, &tx);
        let mut b = connect_client(&listener, &tx);

        tx.blocking_send(WsMsg::Broadcast(UpdateMessage::Reload))
            .unwrap();
        assert_eq!(recv_text(&mut a), r#"{"type":"reload"}"#);
        assert_eq!(recv_text(&mut b), r#"{"type":"reload"}"#);

        tx.blocking_send(WsMsg::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_closed_client_is_excluded_from_broadcasts() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let (tx, handle) = run_actor(None);

        let mut gone = connect_client(&listener, &tx);
        let mut stays = connect_client(&listener, &tx);

        gone.close(None).unwrap();
        // Give the reader loop a poll cycle to notice the close
        std::thread::sleep(Duration::from_millis(300));

        tx.blocking_send(WsMsg::Broadcast(UpdateMessage::Reload))
            .unwrap();
        assert_eq!(recv_text(&mut stays), r#"{"type":"reload"}"#);

        tx.blocking_send(WsMsg::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_pending_error_replayed_to_new_client() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let (tx, handle) = run_actor(Some("src/index.ts: oops".to_string()));

        let mut late = connect_client(&listener, &tx);
        let text = recv_text(&mut late);
        assert!(text.contains(r#""type":"error""#));
        assert!(text.contains("oops"));

        tx.blocking_send(WsMsg::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_silent_connection_does_not_block_broadcasts() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let (tx, handle) = run_actor(None);

        // A socket that connects but never speaks WebSocket: the handshake
        // must time out instead of wedging the actor
        let addr = listener.local_addr().unwrap();
        let _silent = TcpStream::connect(addr).unwrap();
        let (server_stream, _) = listener.accept().unwrap();
        tx.blocking_send(WsMsg::AddClient(server_stream)).unwrap();

        let mut real = connect_client(&listener, &tx);
        tx.blocking_send(WsMsg::Broadcast(UpdateMessage::Reload))
            .unwrap();
        assert_eq!(recv_text(&mut real), r#"{"type":"reload"}"#);

        tx.blocking_send(WsMsg::Shutdown).unwrap();
        handle.join().unwrap();
    }
}
