//! FileSystem Actor
//!
//! Watches the source tree and sends debounced change batches to the
//! BuildActor. Implements the "Watcher-First" pattern for zero event loss:
//! the watcher starts before the initial build, so edits made during startup
//! buffer instead of vanishing.

use std::path::Path;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::messages::BuildMsg;

// Pure timing and deduplication.
mod debouncer;


use debouncer::Debouncer;

/// FileSystem Actor - watches for file changes
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    watcher: RecommendedWatcher,
    /// Channel to send messages to BuildActor
    build_tx: mpsc::Sender<BuildMsg>,
    /// Debouncer state
    debouncer: Debouncer,
}

impl FsActor {
    /// Create a new FsActor watching the source tree recursively.
    pub fn new(source_dir: &Path, build_tx: mpsc::Sender<BuildMsg>) -> notify::Result<Self> {
        // Create sync channel for notify (it doesn't support async)
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        // Create and configure watcher IMMEDIATELY
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;
        watcher.watch(source_dir, RecursiveMode::Recursive)?;

        // Events are now buffering in notify_rx

        Ok(Self {
            notify_rx,
            watcher,
            build_tx,
            debouncer: Debouncer::new(),
        })
    }

    /// Run the actor event loop
    pub async fn run(self) {
        // Extract fields before consuming self
        let notify_rx = self.notify_rx;
        let build_tx = self.build_tx;
        let mut debouncer = self.debouncer;
        let _watcher = self.watcher;

        let (async_tx, mut async_rx) = tokio::sync::mpsc::channel::<notify::Event>(64);

        // Spawn a thread to poll notify events and send to async channel
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break; // Receiver dropped
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                Some(event) = async_rx.recv() => debouncer.observe(&event),
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    if flush(&mut debouncer, &build_tx).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
}

/// Send a ready batch to the build actor.
///
/// Returns `Err(())` if the BuildActor shut down.
async fn flush(debouncer: &mut Debouncer, build_tx: &mpsc::Sender<BuildMsg>) -> Result<(), ()> {
    let Some(batch) = debouncer.take_if_ready() else {
        return Ok(());
    };

    for (path, kind) in &batch {
        crate::debug!("watch"; "{}: {}", kind.label(), path.display());
    }

    build_tx
        .send(BuildMsg::Changes(batch))
        .await
        .map_err(|_| ())
}
