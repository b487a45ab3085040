// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `faxline login`: interactive sign-in, ignoring any stored refresh token.

use faxline_config::FaxlineConfig;
use faxline_core::FaxlineError;

use crate::wiring;

pub async fn run_login(config: &FaxlineConfig) -> Result<(), FaxlineError> {
    let cloud = wiring::build_cloud(config)?;
    let credentials = cloud.credentials.login().await?;
    println!(
        "Signed in to {}. Access token valid until {}.",
        config.storage.backend,
        credentials.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("Credentials stored in {}", config.vault.dir);
    Ok(())
}
