// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end relay tests.
//!
//! `TestHarness` assembles a relay pipeline and a retention sweeper over the
//! mock backend and mock notifier, with a temporary watch directory and
//! retry journal.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use faxline_cloud::CredentialManager;
use faxline_core::{Credentials, DirectorySource, FaxlineError};
use faxline_identity::IdentityResolver;
use faxline_relay::{PipelineSettings, RelayPipeline, RetentionSweeper, RetryJournal};

use crate::fixtures::{MemoryCredentialStore, StaticAuthenticator, StaticDirectory};
use crate::mock_backend::MockBackend;
use crate::mock_notifier::MockNotifier;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    directory: StaticDirectory,
    debounce: Duration,
    notify_on_failure: bool,
    threshold_days: u32,
    suffix_width: usize,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            directory: StaticDirectory::default(),
            debounce: Duration::ZERO,
            notify_on_failure: false,
            threshold_days: 7,
            suffix_width: 19,
        }
    }

    /// Add a directory table row; `number` must already be normalized.
    pub fn with_directory_entry(mut self, number: &str, name: &str) -> Self {
        self.directory = self.directory.with_entry(number, name);
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_failure_notice(mut self) -> Self {
        self.notify_on_failure = true;
        self
    }

    pub fn with_threshold_days(mut self, days: u32) -> Self {
        self.threshold_days = days;
        self
    }

    /// Build the harness, creating the temp directory layout.
    pub fn build(self) -> Result<TestHarness, FaxlineError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| FaxlineError::Journal { source: e })?;
        let watch_dir = temp_dir.path().join("inbox");
        std::fs::create_dir_all(&watch_dir).map_err(|e| FaxlineError::Journal { source: e })?;
        let journal = RetryJournal::new(temp_dir.path().join("state").join("unsent.txt"));

        let notifier = Arc::new(MockNotifier::new());
        // Expired with a refresh token, so the first use refreshes silently.
        let store = Arc::new(MemoryCredentialStore::with(Credentials::from_expires_in(
            "seed-token".into(),
            0,
            Some("seed-refresh".into()),
            chrono::Utc::now(),
        )));
        let authenticator = Arc::new(StaticAuthenticator::default());
        let credentials = Arc::new(CredentialManager::new(
            store.clone(),
            authenticator.clone(),
            chrono::Duration::seconds(300),
        ));
        let backend = Arc::new(MockBackend::new().with_credentials(credentials.clone()));

        let directory: Arc<dyn DirectorySource> = Arc::new(self.directory);
        let resolver = Arc::new(IdentityResolver::new(Some(directory), self.suffix_width));

        let settings = PipelineSettings {
            extension: ".pdf".into(),
            debounce: self.debounce,
            folder: "FAX".into(),
            notify_on_failure: self.notify_on_failure,
        };
        let pipeline = Arc::new(RelayPipeline::new(
            backend.clone(),
            resolver,
            notifier.clone(),
            journal.clone(),
            settings,
        ));
        let sweeper = Arc::new(RetentionSweeper::new(
            backend.clone(),
            credentials.clone(),
            "FAX".into(),
            self.threshold_days,
            Duration::from_secs(86_400),
        ));

        Ok(TestHarness {
            backend,
            notifier,
            store,
            authenticator,
            credentials,
            pipeline,
            sweeper,
            journal,
            watch_dir,
            _temp_dir: temp_dir,
        })
    }
}

/// Assembled relay stack over mocks. Dropping it removes the temp directory.
pub struct TestHarness {
    pub backend: Arc<MockBackend>,
    pub notifier: Arc<MockNotifier>,
    pub store: Arc<MemoryCredentialStore>,
    pub authenticator: Arc<StaticAuthenticator>,
    pub credentials: Arc<CredentialManager>,
    pub pipeline: Arc<RelayPipeline>,
    pub sweeper: Arc<RetentionSweeper>,
    pub journal: RetryJournal,
    pub watch_dir: PathBuf,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Writes a small PDF into the watch directory and returns its path.
    pub fn drop_file(&self, file_name: &str) -> Result<PathBuf, FaxlineError> {
        let path = self.watch_dir.join(file_name);
        std::fs::write(&path, b"%PDF-1.4\n%%EOF\n").map_err(|e| FaxlineError::Journal { source: e })?;
        Ok(path)
    }

    pub async fn journal_entries(&self) -> Result<Vec<PathBuf>, FaxlineError> {
        self.journal.drain_all().await
    }
}
