//! Actor Coordinator - wires up and runs the watch-mode actor system.
//!
//! The Coordinator is a thin orchestrator that:
//! - Starts the WebSocket listener
//! - Wires up actors and runs them concurrently
//! - Tears them down in order on shutdown: build context first, client
//!   connections last
//!
//! The watch side is created separately (`WatchHandles`) and earlier than
//! the rest: the notify watcher must already be attached while the initial
//! build runs, so edits made during startup buffer instead of vanishing.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::build::BuildActor;
use super::fs::FsActor;
use super::messages::{BuildMsg, WsMsg};
use super::ws::WsActor;
use crate::config::DevConfig;
use crate::pipeline::AssetPipeline;

const CHANNEL_BUFFER: usize = 32;

/// Watch-side handles, created before the initial build.
///
/// Constructing this attaches the notify watcher immediately; events buffer
/// in the FsActor's channel until the coordinator starts running it.
pub struct WatchHandles {
    fs_actor: FsActor,
    build_tx: mpsc::Sender<BuildMsg>,
    build_rx: mpsc::Receiver<BuildMsg>,
}

impl WatchHandles {
    pub fn new(source_dir: &Path) -> Result<Self> {
        let (build_tx, build_rx) = mpsc::channel::<BuildMsg>(CHANNEL_BUFFER);
        let fs_actor = FsActor::new(source_dir, build_tx.clone())
            .map_err(|e| anyhow::anyhow!("watcher failed: {}", e))?;
        Ok(Self {
            fs_actor,
            build_tx,
            build_rx,
        })
    }
}

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator {
    config: Arc<DevConfig>,
    pipeline: AssetPipeline,
    ws_port: u16,
    watch: WatchHandles,
    shutdown_rx: Option<Receiver<()>>,
    pending_error: Option<String>,
}

impl Coordinator {
    pub fn new(
        config: Arc<DevConfig>,
        pipeline: AssetPipeline,
        ws_port: u16,
        watch: WatchHandles,
    ) -> Self {
        Self {
            config,
            pipeline,
            ws_port,
            watch,
            shutdown_rx: None,
            pending_error: None,
        }
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Seed the error replayed to new clients (initial build failed).
    pub fn with_pending_error(mut self, error: String) -> Self {
        self.pending_error = Some(error);
        self
    }

    /// Run the actor system.
    pub async fn run(mut self) -> Result<()> {
        let (ws_tx, ws_rx) = mpsc::channel::<WsMsg>(CHANNEL_BUFFER);

        crate::reload::server::start_ws_listener(
            self.config.serve.interface,
            self.ws_port,
            ws_tx.clone(),
        )?;

        let WatchHandles {
            fs_actor,
            build_tx,
            build_rx,
        } = self.watch;
        let build_actor = BuildActor::new(build_rx, ws_tx.clone(), self.pipeline);
        let ws_actor = match self.pending_error.take() {
            Some(error) => WsActor::new(ws_rx).with_pending_error(error),
            None => WsActor::new(ws_rx),
        };

        crate::debug!("actor"; "start");
        let shutdown_rx = self.shutdown_rx.take();
        run_actors(fs_actor, build_actor, ws_actor, build_tx, ws_tx, shutdown_rx).await;
        crate::debug!("actor"; "stopped");
        Ok(())
    }
}

/// Run all actors concurrently, then tear down in dependency order.
async fn run_actors(
    fs: FsActor,
    build: BuildActor,
    ws: WsActor,
    build_tx: mpsc::Sender<BuildMsg>,
    ws_tx: mpsc::Sender<WsMsg>,
    shutdown_rx: Option<Receiver<()>>,
) {
    let fs_handle = tokio::spawn(async move { fs.run().await });
    let build_handle = tokio::spawn(async move { build.run().await });
    let ws_handle = tokio::spawn(async move { ws.run().await });

    if let Some(rx) = shutdown_rx {
        loop {
            if rx.try_recv().is_ok() {
                crate::debug!("actor"; "shutdown signal received");
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    } else {
        // No external signal: run until the watcher stops
        let _ = fs_handle.await;
    }

    // Dispose the build context before closing client connections
    let _ = build_tx.send(BuildMsg::Shutdown).await;
    let _ = tokio::time::timeout(Duration::from_millis(500), build_handle).await;

    let _ = ws_tx.send(WsMsg::Shutdown).await;
    let _ = tokio::time::timeout(Duration::from_millis(500), ws_handle).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ChangeKind;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_edits_during_startup_are_not_lost() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();

        let watch = WatchHandles::new(&src).unwrap();

        // A file landing while the initial build is still running: the
        // watcher is already attached, so the event buffers until the
        // actor starts
        fs::write(src.join("late.ts"), "export const x = 1;\n").unwrap();

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async move {
            let WatchHandles {
                fs_actor,
                build_tx: _build_tx,
                mut build_rx,
            } = watch;
            tokio::spawn(fs_actor.run());

            let msg = tokio::time::timeout(Duration::from_secs(5), build_rx.recv())
                .await
                .expect("watcher should deliver the startup edit")
                .expect("channel should stay open");
            let BuildMsg::Changes(batch) = msg else {
                panic!("expected a change batch");
            };
            assert!(batch.iter().any(|(path, kind)| {
                path.ends_with("late.ts")
                    && matches!(kind, ChangeKind::Created | ChangeKind::Modified)
            }));
        });
    }
}
