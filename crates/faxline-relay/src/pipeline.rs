// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The relay pipeline: detect, debounce, resolve, upload, link, notify.
//!
//! Each qualifying file is claimed by basename before any waiting or network
//! traffic, so a second event for the same name in one run is a no-op. Any
//! failure after the claim lands the file in the retry journal.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use faxline_config::FaxlineConfig;
use faxline_core::{
    FaxlineError, Notifier, RelayOutcome, StorageBackend, WatchEvent, file_name_of,
};
use faxline_identity::IdentityResolver;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::journal::RetryJournal;

/// Pipeline knobs taken from `[watch]`, `[storage]` and `[relay]`.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Lower-cased, including the leading dot.
    pub extension: String,
    pub debounce: Duration,
    pub folder: String,
    pub notify_on_failure: bool,
}

impl PipelineSettings {
    pub fn from_config(config: &FaxlineConfig) -> Self {
        Self {
            extension: config.watch.extension.to_lowercase(),
            debounce: Duration::from_millis(config.watch.debounce_ms),
            folder: config.storage.folder.clone(),
            notify_on_failure: config.relay.notify_on_failure,
        }
    }
}

/// Counts from one journal replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Entries whose file is gone, or repeated within the journal.
    pub dropped: usize,
}

pub struct RelayPipeline {
    backend: Arc<dyn StorageBackend>,
    resolver: Arc<IdentityResolver>,
    notifier: Arc<dyn Notifier>,
    journal: RetryJournal,
    settings: PipelineSettings,
    notified: Mutex<HashSet<String>>,
    folder_ready: AtomicBool,
}

impl RelayPipeline {
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        resolver: Arc<IdentityResolver>,
        notifier: Arc<dyn Notifier>,
        journal: RetryJournal,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            backend,
            resolver,
            notifier,
            journal,
            settings,
            notified: Mutex::new(HashSet::new()),
            folder_ready: AtomicBool::new(false),
        }
    }

    /// Basenames claimed so far in this run.
    pub async fn notified_names(&self) -> HashSet<String> {
        self.notified.lock().await.clone()
    }

    /// Runs one watch event through the state machine.
    pub async fn handle_event(&self, event: WatchEvent, cancel: &CancellationToken) -> RelayOutcome {
        let Some(name) = self.qualifying_name(&event) else {
            return RelayOutcome::Ignored;
        };
        if !self.claim(&name).await {
            debug!(file_name = %name, "already handled in this run");
            return RelayOutcome::Duplicate;
        }

        tokio::select! {
            _ = tokio::time::sleep(self.settings.debounce) => {}
            _ = cancel.cancelled() => {
                info!(file_name = %name, "shutdown during debounce, journaling");
                self.journal_path(&event.path).await;
                return RelayOutcome::Journaled;
            }
        }

        match self.try_relay(&event.path, &name).await {
            Ok((display_name, link)) => RelayOutcome::Done { display_name, link },
            Err(e) => {
                warn!(file_name = %name, error = %e, "relay failed, journaling for retry");
                self.journal_path(&event.path).await;
                if self.settings.notify_on_failure {
                    if let Err(e) = self.notifier.notify(&name, None).await {
                        warn!(error = %e, "failure notice not delivered");
                    }
                }
                RelayOutcome::Journaled
            }
        }
    }

    /// Retries every journaled file, then rewrites the journal to the
    /// entries that failed again.
    ///
    /// The journal is only replaced after the whole pass, so a crash midway
    /// leaves every entry in place.
    pub async fn replay_journal(&self) -> Result<ReplaySummary, FaxlineError> {
        let entries = self.journal.drain_all().await?;
        let mut summary = ReplaySummary::default();
        if entries.is_empty() {
            return Ok(summary);
        }
        info!(entries = entries.len(), "replaying retry journal");

        let mut still_failing = Vec::new();
        for path in entries {
            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                warn!(path = %path.display(), "journaled file no longer exists, dropping");
                summary.dropped += 1;
                continue;
            }
            let Some(name) = file_name_of(&path).map(str::to_owned) else {
                warn!(path = %path.display(), "journaled path has no usable file name, dropping");
                summary.dropped += 1;
                continue;
            };
            if !self.claim(&name).await {
                summary.dropped += 1;
                continue;
            }

            match self.try_relay(&path, &name).await {
                Ok(_) => summary.succeeded += 1,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "journaled file failed again");
                    summary.failed += 1;
                    still_failing.push(path);
                }
            }
        }

        self.journal.rewrite(&still_failing).await?;
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            dropped = summary.dropped,
            "journal replay finished"
        );
        Ok(summary)
    }

    /// Consumes watch events until cancellation or channel close.
    ///
    /// Events still buffered at shutdown are journaled, not dropped.
    pub async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<WatchEvent>, cancel: CancellationToken) {
        info!("relay worker running");
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping relay worker");
                    break;
                }
                event = rx.recv() => match event {
                    Some(event) => {
                        let outcome = self.handle_event(event, &cancel).await;
                        debug!(?outcome, "event handled");
                    }
                    None => {
                        info!("watch channel closed");
                        return;
                    }
                },
            }
        }

        rx.close();
        while let Ok(event) = rx.try_recv() {
            if let Some(name) = self.qualifying_name(&event) {
                if self.claim(&name).await {
                    self.journal_path(&event.path).await;
                }
            }
        }
        info!("relay worker stopped");
    }

    fn qualifying_name(&self, event: &WatchEvent) -> Option<String> {
        if event.is_directory {
            return None;
        }
        let name = event.file_name()?;
        name.to_lowercase()
            .ends_with(&self.settings.extension)
            .then(|| name.to_string())
    }

    /// Inserts `name` into the notified set. False if it was already there.
    async fn claim(&self, name: &str) -> bool {
        self.notified.lock().await.insert(name.to_string())
    }

    async fn try_relay(&self, path: &Path, file_name: &str) -> Result<(String, String), FaxlineError> {
        let display_name = self
            .resolve(file_name)
            .await
            .unwrap_or_else(|| file_name.to_string());

        if !self.folder_ready.load(Ordering::Acquire) {
            self.backend.ensure_folder(&self.settings.folder).await?;
            self.folder_ready.store(true, Ordering::Release);
        }

        let remote = self.backend.upload(path, &self.settings.folder).await?;
        let link = self.backend.create_share_link(&remote).await?;

        if let Err(e) = self.notifier.notify(&display_name, Some(&link)).await {
            warn!(file_name, error = %e, "notification not delivered");
        }
        info!(
            file_name,
            display_name = %display_name,
            backend = self.backend.name(),
            "fax relayed"
        );
        Ok((display_name, link))
    }

    /// The directory table does file I/O, so lookups run off the async
    /// workers.
    async fn resolve(&self, file_name: &str) -> Option<String> {
        let resolver = Arc::clone(&self.resolver);
        let name = file_name.to_string();
        match tokio::task::spawn_blocking(move || resolver.resolve(&name)).await {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(file_name, error = %e, "sender lookup task failed");
                None
            }
        }
    }

    async fn journal_path(&self, path: &Path) {
        if let Err(e) = self.journal.append(path).await {
            error!(path = %path.display(), error = %e, "failed to journal file, it will not be retried");
        }
    }
}
