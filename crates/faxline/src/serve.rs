// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `faxline serve` command implementation.
//!
//! Acquires a valid credential, starts the directory watcher, replays the
//! retry journal, then runs the relay worker and the retention sweeper until
//! SIGINT or SIGTERM.

use std::path::Path;
use std::sync::Arc;

use faxline_config::FaxlineConfig;
use faxline_core::FaxlineError;
use faxline_relay::{DirectoryWatcher, RetentionSweeper, install_signal_handler};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::wiring;

/// Runs the `faxline serve` command.
///
/// Interactive sign-in is only offered here, before the watcher starts. An
/// authentication failure at this point is fatal.
pub async fn run_serve(config: FaxlineConfig) -> Result<(), FaxlineError> {
    info!(
        directory = %config.watch.directory,
        backend = %config.storage.backend,
        folder = %config.storage.folder,
        "faxline starting"
    );

    let cloud = wiring::build_cloud(&config)?;
    let pipeline = Arc::new(wiring::build_pipeline(&config, cloud.backend.clone())?);

    if let Err(e) = cloud.credentials.acquire().await {
        error!(error = %e, "could not obtain storage credentials");
        return Err(e);
    }

    let cancel = install_signal_handler();

    // Watch before replaying so arrivals during replay wait in the channel.
    let (tx, rx) = mpsc::channel(config.watch.channel_capacity);
    let watcher = DirectoryWatcher::start(Path::new(&config.watch.directory), tx)?;

    if let Err(e) = pipeline.replay_journal().await {
        warn!(error = %e, "retry journal replay failed, continuing with live events");
    }

    let sweeper = if config.retention.enabled {
        let sweeper = Arc::new(RetentionSweeper::from_config(
            &config,
            cloud.backend.clone(),
            cloud.credentials.clone(),
        ));
        Some(tokio::spawn(sweeper.run(cancel.clone())))
    } else {
        info!("retention sweeper disabled");
        None
    };

    let worker = tokio::spawn(pipeline.clone().run(rx, cancel.clone()));
    if let Err(e) = worker.await {
        error!(error = %e, "relay worker panicked");
    }
    // The worker also stops when the watch channel closes.
    cancel.cancel();

    if let Some(sweeper) = sweeper {
        if let Err(e) = sweeper.await {
            error!(error = %e, "retention sweeper panicked");
        }
    }
    drop(watcher);

    info!("faxline stopped");
    Ok(())
}
