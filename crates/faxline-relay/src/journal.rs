// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable retry journal: one absolute file path per line.
//!
//! The journal is a queue with duplicates tolerated. Appends are a single
//! write on an append-mode handle; replacement goes through a temp file and
//! a rename, so a crash never leaves a truncated journal behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use faxline_core::FaxlineError;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

fn journal_err(source: std::io::Error) -> FaxlineError {
    FaxlineError::Journal { source }
}

/// File-backed list of local paths whose relay failed.
#[derive(Debug, Clone)]
pub struct RetryJournal {
    path: PathBuf,
}

impl RetryJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `entry` as one line, made absolute against the current
    /// directory if it is relative.
    pub async fn append(&self, entry: &Path) -> Result<(), FaxlineError> {
        let entry = std::path::absolute(entry).map_err(journal_err)?;
        self.ensure_parent().await?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(journal_err)?;
        let line = format!("{}\n", entry.to_string_lossy());
        file.write_all(line.as_bytes()).await.map_err(journal_err)?;
        file.sync_data().await.map_err(journal_err)?;
        debug!(path = %entry.display(), "journaled");
        Ok(())
    }

    /// Every entry in order. A missing journal reads as empty.
    pub async fn drain_all(&self) -> Result<Vec<PathBuf>, FaxlineError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(journal_err(e)),
        };
        Ok(contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect())
    }

    /// Empties the journal.
    pub async fn clear(&self) -> Result<(), FaxlineError> {
        self.rewrite(&[]).await
    }

    /// Atomically replaces the journal with `entries`.
    pub async fn rewrite(&self, entries: &[PathBuf]) -> Result<(), FaxlineError> {
        self.ensure_parent().await?;
        let mut body = String::new();
        for entry in entries {
            let entry = std::path::absolute(entry).map_err(journal_err)?;
            body.push_str(&entry.to_string_lossy());
            body.push('\n');
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = fs::File::create(&tmp).await.map_err(journal_err)?;
        file.write_all(body.as_bytes()).await.map_err(journal_err)?;
        file.sync_all().await.map_err(journal_err)?;
        drop(file);
        fs::rename(&tmp, &self.path).await.map_err(journal_err)?;
        debug!(entries = entries.len(), "journal rewritten");
        Ok(())
    }

    async fn ensure_parent(&self) -> Result<(), FaxlineError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(journal_err)?;
            }
        }
        Ok(())
    }
}
