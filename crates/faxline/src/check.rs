// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `faxline check` command implementation.
//!
//! Offline checks of the local environment: the watched directory, the
//! sender directory table, stored credentials, and the retry journal. No
//! network calls are made.

use std::path::Path;

use chrono::Utc;
use faxline_config::FaxlineConfig;
use faxline_core::{CredentialStore, FaxlineError};
use faxline_identity::{DirectoryTable, TableFormat};
use faxline_relay::RetryJournal;
use faxline_vault::EncryptedFileStore;

/// Status of a diagnostic check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: &'static str,
    pub status: CheckStatus,
    pub message: String,
}

impl CheckResult {
    fn new(name: &'static str, status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            name,
            status,
            message: message.into(),
        }
    }
}

pub async fn run_check(config: &FaxlineConfig) -> Result<(), FaxlineError> {
    let results = collect_checks(config).await;

    println!();
    println!("  faxline check");
    println!("  {}", "-".repeat(50));
    for result in &results {
        let symbol = match result.status {
            CheckStatus::Pass => "ok  ",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "FAIL",
        };
        println!("  [{symbol}] {:<18} {}", result.name, result.message);
    }
    println!();

    let failures = results
        .iter()
        .filter(|r| r.status == CheckStatus::Fail)
        .count();
    if failures > 0 {
        return Err(FaxlineError::Config(format!("{failures} check(s) failed")));
    }
    Ok(())
}

pub async fn collect_checks(config: &FaxlineConfig) -> Vec<CheckResult> {
    vec![
        check_watch_directory(Path::new(&config.watch.directory)),
        check_directory_table(config),
        check_credentials(config),
        check_journal(&config.relay.journal_path).await,
    ]
}

fn check_watch_directory(dir: &Path) -> CheckResult {
    const NAME: &str = "watch directory";
    if dir.is_dir() {
        CheckResult::new(NAME, CheckStatus::Pass, dir.display().to_string())
    } else {
        CheckResult::new(
            NAME,
            CheckStatus::Fail,
            format!("{} is not a directory", dir.display()),
        )
    }
}

fn check_directory_table(config: &FaxlineConfig) -> CheckResult {
    const NAME: &str = "directory table";
    let Some(path) = &config.identity.directory_path else {
        return CheckResult::new(
            NAME,
            CheckStatus::Warn,
            "not configured, fax numbers are shown as-is",
        );
    };
    let table = DirectoryTable::new(
        path,
        config.identity.fax_column.clone(),
        config.identity.name_column.clone(),
    );
    let kind = match table.format() {
        TableFormat::Workbook => "workbook",
        TableFormat::Csv => "CSV",
    };
    match table.read_entries() {
        Ok(entries) => CheckResult::new(
            NAME,
            CheckStatus::Pass,
            format!("{} entries in {kind} {path}", entries.len()),
        ),
        Err(e) => CheckResult::new(NAME, CheckStatus::Fail, e.to_string()),
    }
}

fn check_credentials(config: &FaxlineConfig) -> CheckResult {
    const NAME: &str = "credentials";
    let store = EncryptedFileStore::new(&config.vault.dir);
    match store.load() {
        Ok(None) => CheckResult::new(
            NAME,
            CheckStatus::Warn,
            "none stored, run `faxline login` before serving",
        ),
        Ok(Some(creds)) => {
            let remaining = creds.remaining(Utc::now());
            match (remaining.num_seconds() > 0, creds.refresh_token.is_some()) {
                (true, _) => CheckResult::new(
                    NAME,
                    CheckStatus::Pass,
                    format!("access token valid for {} min", remaining.num_minutes()),
                ),
                (false, true) => CheckResult::new(
                    NAME,
                    CheckStatus::Pass,
                    "access token expired, refresh token present",
                ),
                (false, false) => CheckResult::new(
                    NAME,
                    CheckStatus::Warn,
                    "access token expired and no refresh token, run `faxline login`",
                ),
            }
        }
        Err(e) => CheckResult::new(NAME, CheckStatus::Fail, e.to_string()),
    }
}

async fn check_journal(path: &str) -> CheckResult {
    const NAME: &str = "retry journal";
    match RetryJournal::new(path).drain_all().await {
        Ok(entries) if entries.is_empty() => CheckResult::new(NAME, CheckStatus::Pass, "empty"),
        Ok(entries) => CheckResult::new(
            NAME,
            CheckStatus::Warn,
            format!("{} file(s) waiting for retry on next start", entries.len()),
        ),
        Err(e) => CheckResult::new(NAME, CheckStatus::Fail, e.to_string()),
    }
}
