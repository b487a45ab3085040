// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `faxline sweep`: one retention sweep, outside the daemon schedule.

use chrono::Utc;
use faxline_config::FaxlineConfig;
use faxline_core::FaxlineError;
use faxline_relay::RetentionSweeper;

use crate::wiring;

pub async fn run_sweep(config: &FaxlineConfig) -> Result<(), FaxlineError> {
    let cloud = wiring::build_cloud(config)?;
    let sweeper = RetentionSweeper::from_config(config, cloud.backend, cloud.credentials);
    let report = sweeper.sweep_once(Utc::now()).await?;

    println!(
        "Scanned {} file(s) in {}: {} deleted, {} failed (threshold {} days).",
        report.scanned,
        config.storage.folder,
        report.deleted,
        report.failed,
        config.retention.threshold_days
    );
    if report.failed > 0 {
        return Err(FaxlineError::Transfer {
            message: format!("{} expired file(s) could not be deleted", report.failed),
            status: None,
            source: None,
        });
    }
    Ok(())
}
