//! Change-batch debouncing for the file watcher.
//!
//! Raw notify events are folded into a pending batch keyed by path, so a
//! save storm collapses into one net change per file. The batch is released
//! once the tree has been quiet for the settle window and the cooldown since
//! the previous release has passed.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use crate::pipeline::ChangeKind;
use crate::utils::path::normalize_path;

/// Quiet window after the last relevant event before a batch is released.
pub(super) const DEBOUNCE_MS: u64 = 300;
/// Minimum spacing between two released batches.
pub(super) const REBUILD_COOLDOWN_MS: u64 = 800;

/// Pure timing and deduplication state. No channels, no global state.
pub(super) struct Debouncer {
    /// Net effect per path since the last release
    pub(super) pending: FxHashMap<PathBuf, ChangeKind>,
    pub(super) last_event: Option<Instant>,
    pub(super) last_release: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new() -> Self {
        Self {
            pending: FxHashMap::default(),
            last_event: None,
            last_release: None,
        }
    }

    /// Fold a raw notify event into the pending batch.
    pub(super) fn observe(&mut self, event: &notify::Event) {
        let Some(kind) = classify(event) else {
            return;
        };
        crate::debug!("watch"; "raw notify: {:?} {:?}", event.kind, event.paths);

        for path in &event.paths {
            if editor_artifact(path) {
                continue;
            }
            self.record(normalize_path(path), kind);
        }
    }

    /// Fold one observation into the batch, tracking the net effect per
    /// path: a removed file that comes back re-enters as its new kind, a
    /// delete overrides a modify, and create followed by delete cancels out.
    /// A repeat of the recorded kind changes nothing.
    fn record(&mut self, path: PathBuf, kind: ChangeKind) {
        use ChangeKind::{Created, Modified, Removed};

        let prev = self.pending.get(&path).copied();
        let net = match (prev, kind) {
            (None, new) => Some(new),
            (Some(Removed), Created | Modified) => Some(kind),
            (Some(Modified), Removed) => Some(Removed),
            (Some(Created), Removed) => None,
            (Some(prev), _) => Some(prev),
        };
        if net == prev {
            return;
        }

        match net {
            Some(kind) => {
                crate::debug!("watch"; "event {}: {}", kind.label(), path.display());
                self.pending.insert(path, kind);
            }
            None => {
                crate::debug!("watch"; "discard created+removed: {}", path.display());
                self.pending.remove(&path);
            }
        }
        self.last_event = Some(Instant::now());
    }

    /// Release the batch once the settle window and cooldown have elapsed.
    /// Paths come out in stable sorted order.
    pub(super) fn take_if_ready(&mut self) -> Option<Vec<(PathBuf, ChangeKind)>> {
        if !self.is_ready() {
            return None;
        }

        self.last_event = None;
        self.last_release = Some(Instant::now());

        let mut batch: Vec<_> = self.pending.drain().collect();
        batch.sort_by(|a, b| a.0.cmp(&b.0));
        Some(batch)
    }

    pub(super) fn is_ready(&self) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };

        if last_event.elapsed() < Duration::from_millis(DEBOUNCE_MS) {
            return false;
        }

        if let Some(last_release) = self.last_release
            && last_release.elapsed() < Duration::from_millis(REBUILD_COOLDOWN_MS)
        {
            return false;
        }

        !self.pending.is_empty()
    }

    /// Precise sleep duration until the next possible release time.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };

        let debounce_remaining =
            Duration::from_millis(DEBOUNCE_MS).saturating_sub(last_event.elapsed());

        let cooldown_remaining = self
            .last_release
            .map(|t| Duration::from_millis(REBUILD_COOLDOWN_MS).saturating_sub(t.elapsed()))
            .unwrap_or(Duration::ZERO);

        debounce_remaining
            .max(cooldown_remaining)
            .max(Duration::from_millis(1))
    }
}

/// Map a notify event kind onto a rebuild-relevant change, if any.
fn classify(event: &notify::Event) -> Option<ChangeKind> {
    use notify::EventKind;
    match event.kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        // Metadata-only modifies (mtime/chmod noise) would loop the rebuild
        EventKind::Modify(notify::event::ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        _ => None,
    }
}

/// Editor droppings: swap/backup files and hidden siblings.
fn editor_artifact(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}
