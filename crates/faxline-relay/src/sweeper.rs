// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic retention sweep: unshare and delete remote files past the
//! retention window.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use faxline_cloud::CredentialManager;
use faxline_config::FaxlineConfig;
use faxline_core::{FaxlineError, RemoteFile, StorageBackend, SweepReport};
use futures::TryStreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct RetentionSweeper {
    backend: Arc<dyn StorageBackend>,
    credentials: Arc<CredentialManager>,
    folder: String,
    threshold_days: i64,
    interval: Duration,
    run_on_startup: bool,
}

impl RetentionSweeper {
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        credentials: Arc<CredentialManager>,
        folder: String,
        threshold_days: u32,
        interval: Duration,
    ) -> Self {
        Self {
            backend,
            credentials,
            folder,
            threshold_days: i64::from(threshold_days),
            interval,
            run_on_startup: true,
        }
    }

    pub fn from_config(
        config: &FaxlineConfig,
        backend: Arc<dyn StorageBackend>,
        credentials: Arc<CredentialManager>,
    ) -> Self {
        Self::new(
            backend,
            credentials,
            config.storage.folder.clone(),
            config.retention.threshold_days,
            Duration::from_secs(config.retention.interval_secs),
        )
        .with_run_on_startup(config.retention.run_on_startup)
    }

    pub fn with_run_on_startup(mut self, run_on_startup: bool) -> Self {
        self.run_on_startup = run_on_startup;
        self
    }

    /// True when `file` is at least `threshold_days` whole days old at `now`.
    pub fn is_expired(&self, file: &RemoteFile, now: DateTime<Utc>) -> bool {
        file.age_days(now) >= self.threshold_days
    }

    /// One sweep at `now`.
    ///
    /// Listing or credential failures abort the run. A failure on a single
    /// file is logged and counted, and the sweep moves on.
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> Result<SweepReport, FaxlineError> {
        self.credentials.get_valid().await?;

        let files: Vec<RemoteFile> = self.backend.list_files(&self.folder).try_collect().await?;
        let mut report = SweepReport {
            scanned: files.len(),
            ..SweepReport::default()
        };

        for file in files.iter().filter(|f| self.is_expired(f, now)) {
            match self.remove(file).await {
                Ok(()) => {
                    info!(file_name = %file.name, age_days = file.age_days(now), "expired file deleted");
                    report.deleted += 1;
                }
                Err(e) => {
                    warn!(file_name = %file.name, error = %e, "failed to delete expired file");
                    report.failed += 1;
                }
            }
        }

        if report.deleted == 0 && report.failed == 0 {
            info!(scanned = report.scanned, "retention sweep found nothing to delete");
        } else {
            info!(
                scanned = report.scanned,
                deleted = report.deleted,
                failed = report.failed,
                "retention sweep finished"
            );
        }
        Ok(report)
    }

    async fn remove(&self, file: &RemoteFile) -> Result<(), FaxlineError> {
        self.backend.revoke_links(file).await?;
        self.backend.delete_file(file).await
    }

    /// Sweeps every `interval` until cancelled.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        if !self.run_on_startup {
            // The first tick completes immediately.
            interval.tick().await;
        }
        info!(
            interval_secs = self.interval.as_secs(),
            threshold_days = self.threshold_days,
            "retention sweeper started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    debug!("retention sweep starting");
                    if let Err(e) = self.sweep_once(Utc::now()).await {
                        warn!(error = %e, "retention sweep failed (non-fatal)");
                    }
                }
                _ = cancel.cancelled() => {
                    info!("retention sweeper shutting down");
                    break;
                }
            }
        }
    }
}
