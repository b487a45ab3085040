// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem watcher feeding creation events into the relay channel.

use std::path::Path;

use faxline_core::{FaxlineError, WatchEvent};
use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Owns the platform watcher. Dropping it stops and joins the watch thread.
pub struct DirectoryWatcher {
    _watcher: RecommendedWatcher,
}

impl DirectoryWatcher {
    /// Watches `dir` (non-recursively) and forwards creation events to `tx`.
    ///
    /// The callback runs on the watcher's own thread and blocks on a full
    /// channel, so bursts are buffered rather than dropped.
    pub fn start(dir: &Path, tx: mpsc::Sender<WatchEvent>) -> Result<Self, FaxlineError> {
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for watch_event in creation_events(&event) {
                    if tx.blocking_send(watch_event).is_err() {
                        debug!("relay channel closed, dropping watch event");
                        return;
                    }
                }
            }
            Err(e) => warn!(error = %e, "filesystem watcher error"),
        })
        .map_err(|e| FaxlineError::Watch {
            message: "failed to create filesystem watcher".into(),
            source: Some(Box::new(e)),
        })?;

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| FaxlineError::Watch {
                message: format!("failed to watch {}", dir.display()),
                source: Some(Box::new(e)),
            })?;

        info!(directory = %dir.display(), "watching for new files");
        Ok(Self { _watcher: watcher })
    }
}

/// Translates a raw notify event into relay events.
///
/// Creations and renames into the directory count; modifications and
/// removals do not.
pub(crate) fn creation_events(event: &Event) -> Vec<WatchEvent> {
    let folder_hint = match event.kind {
        EventKind::Create(CreateKind::Folder) => Some(true),
        EventKind::Create(CreateKind::File) => Some(false),
        EventKind::Create(_) => None,
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => None,
        _ => return Vec::new(),
    };

    event
        .paths
        .iter()
        .map(|path| WatchEvent {
            path: path.clone(),
            is_directory: folder_hint.unwrap_or_else(|| path.is_dir()),
        })
        .collect()
}
