// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds the runtime components from configuration.

use std::sync::Arc;

use faxline_cloud::{CloudHandle, ConsolePrompt, build_backend};
use faxline_config::FaxlineConfig;
use faxline_core::{DirectorySource, FaxlineError, StorageBackend};
use faxline_identity::{DirectoryTable, IdentityResolver};
use faxline_line::LineNotifier;
use faxline_relay::{PipelineSettings, RelayPipeline, RetryJournal};
use faxline_vault::EncryptedFileStore;
use tracing::info;

/// Storage backend and credential manager over the encrypted vault.
pub fn build_cloud(config: &FaxlineConfig) -> Result<CloudHandle, FaxlineError> {
    let store = Arc::new(EncryptedFileStore::new(&config.vault.dir));
    let handle = build_backend(config, store, Arc::new(ConsolePrompt))?;
    info!(backend = handle.backend.name(), "storage backend configured");
    Ok(handle)
}

pub fn build_resolver(config: &FaxlineConfig) -> IdentityResolver {
    let directory = config.identity.directory_path.as_ref().map(|path| {
        Arc::new(DirectoryTable::new(
            path,
            config.identity.fax_column.clone(),
            config.identity.name_column.clone(),
        )) as Arc<dyn DirectorySource>
    });
    IdentityResolver::new(directory, config.identity.suffix_width)
}

pub fn build_pipeline(
    config: &FaxlineConfig,
    backend: Arc<dyn StorageBackend>,
) -> Result<RelayPipeline, FaxlineError> {
    let notifier = Arc::new(LineNotifier::from_config(config)?);
    Ok(RelayPipeline::new(
        backend,
        Arc::new(build_resolver(config)),
        notifier,
        RetryJournal::new(&config.relay.journal_path),
        PipelineSettings::from_config(config),
    ))
}
