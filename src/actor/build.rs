//! Build Actor
//!
//! Owns the asset pipeline for the lifetime of watch mode. Rebuilds are
//! serialized by construction: only this actor touches the build context, so
//! two rebuilds can never interleave.
//!
//! Each rebuild outcome is translated into at most one broadcast:
//!
//! - failure: `error` (overlay text)
//! - hot-patchable delta: `hmr` (in-place patches)
//! - anything else that changed: `reload`
//! - nothing buildable changed: no broadcast

use tokio::sync::mpsc;

use super::messages::{BuildMsg, WsMsg};
use crate::logger::{status_error, status_success};
use crate::pipeline::{AssetPipeline, BuildResult, Module, render_diagnostics};
use crate::reload::{ModulePatch, UpdateMessage};

/// Build Actor - rebuilds on filesystem changes
pub struct BuildActor {
    rx: mpsc::Receiver<BuildMsg>,
    ws_tx: mpsc::Sender<WsMsg>,
    pipeline: AssetPipeline,
}

impl BuildActor {
    pub fn new(
        rx: mpsc::Receiver<BuildMsg>,
        ws_tx: mpsc::Sender<WsMsg>,
        pipeline: AssetPipeline,
    ) -> Self {
        Self { rx, ws_tx, pipeline }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                BuildMsg::Changes(changes) => {
                    let result = self.pipeline.rebuild(&changes);
                    let Some(update) = update_for(result) else {
                        continue;
                    };
                    if self.ws_tx.send(WsMsg::Broadcast(update)).await.is_err() {
                        break;
                    }
                }
                BuildMsg::Shutdown => {
                    crate::debug!("build"; "shutting down");
                    break;
                }
            }
        }
        // Dropping self disposes the build context
    }
}

/// Translate a build result into the broadcast update, logging the outcome.
///
/// `None` when the batch touched nothing buildable.
fn update_for(result: BuildResult) -> Option<UpdateMessage> {
    match result {
        BuildResult::Success {
            changed,
            removed,
            hot_patch,
        } => {
            if changed.is_empty() && removed.is_empty() {
                return None;
            }

            if hot_patch {
                status_success(&format!("hot updated {}", summarize(&changed, &removed)));
                let patches = changed
                    .iter()
                    .map(|m| ModulePatch {
                        id: m.id.clone(),
                        js: None,
                        css: m.style.clone(),
                    })
                    .collect();
                return Some(UpdateMessage::hmr(patches));
            }

            status_success(&format!("rebuilt {}", summarize(&changed, &removed)));
            Some(UpdateMessage::Reload)
        }
        BuildResult::Failure { diagnostics } => {
            let text = render_diagnostics(&diagnostics);
            status_error("build failed", &text);
            Some(UpdateMessage::error(text))
        }
    }
}

fn summarize(changed: &[Module], removed: &[String]) -> String {
    match (changed, removed) {
        ([only], []) => only.id.clone(),
        ([], [only]) => only.clone(),
        _ => format!("{} modules", changed.len() + removed.len()),
    }
}
