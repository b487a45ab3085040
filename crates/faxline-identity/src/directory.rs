// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-backed fax directory.
//!
//! The table is an Excel workbook (first sheet) or a CSV file, picked by
//! extension. Its header row names the fax-number and display-name columns.
//! It is parsed on first lookup and re-parsed whenever its modification time
//! changes, so operators can edit it while the relay runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use faxline_core::{DirectorySource, FaxlineError};
use tracing::{debug, info};

use crate::normalize::directory_key;
use crate::workbook;

struct Cached {
    modified: SystemTime,
    entries: HashMap<String, String>,
}

/// On-disk layout of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Workbook,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Self {
        if workbook::is_workbook(path) {
            Self::Workbook
        } else {
            Self::Csv
        }
    }
}

/// Fax directory read from a workbook or CSV file.
pub struct DirectoryTable {
    path: PathBuf,
    format: TableFormat,
    fax_column: String,
    name_column: String,
    cache: Mutex<Option<Cached>>,
}

impl DirectoryTable {
    pub fn new(
        path: impl Into<PathBuf>,
        fax_column: impl Into<String>,
        name_column: impl Into<String>,
    ) -> Self {
        let path = path.into();
        Self {
            format: TableFormat::from_path(&path),
            path,
            fax_column: fax_column.into(),
            name_column: name_column.into(),
            cache: Mutex::new(None),
        }
    }

    pub fn format(&self) -> TableFormat {
        self.format
    }

    fn modified(&self) -> Result<SystemTime, FaxlineError> {
        std::fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .map_err(|e| {
                FaxlineError::Resolution(format!(
                    "cannot stat directory {}: {e}",
                    self.path.display()
                ))
            })
    }

    /// Parses the whole file into `[normalized] -> name`.
    pub fn read_entries(&self) -> Result<HashMap<String, String>, FaxlineError> {
        let rows = match self.format {
            TableFormat::Csv => self.read_csv_rows()?,
            TableFormat::Workbook => workbook::read_rows(&self.path)?,
        };
        let mut rows = rows.into_iter();
        let headers = rows.next().unwrap_or_default();

        let column = |name: &str| {
            headers.iter().position(|h| h == name).ok_or_else(|| {
                FaxlineError::Resolution(format!(
                    "directory {} has no `{name}` column",
                    self.path.display()
                ))
            })
        };
        let fax_idx = column(&self.fax_column)?;
        let name_idx = column(&self.name_column)?;

        let mut entries = HashMap::new();
        for row in rows {
            let (Some(fax), Some(name)) = (row.get(fax_idx), row.get(name_idx)) else {
                continue;
            };
            if fax.is_empty() || name.is_empty() {
                continue;
            }
            entries.entry(directory_key(fax)).or_insert_with(|| name.clone());
        }
        Ok(entries)
    }

    fn read_csv_rows(&self) -> Result<Vec<Vec<String>>, FaxlineError> {
        let err = |e: csv::Error| {
            FaxlineError::Resolution(format!(
                "cannot read directory {}: {e}",
                self.path.display()
            ))
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(&self.path)
            .map_err(err)?;

        reader
            .records()
            .map(|record| {
                record
                    .map(|r| r.iter().map(str::to_string).collect::<Vec<_>>())
                    .map_err(err)
            })
            .collect()
    }
}

impl DirectorySource for DirectoryTable {
    fn lookup(&self, key: &str) -> Result<Option<String>, FaxlineError> {
        let modified = self.modified()?;
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| FaxlineError::Internal("directory cache poisoned".to_string()))?;

        let stale = cache.as_ref().is_none_or(|c| c.modified != modified);
        if stale {
            let entries = self.read_entries()?;
            info!(
                path = %self.path.display(),
                entries = entries.len(),
                "loaded fax directory"
            );
            *cache = Some(Cached { modified, entries });
        }

        let hit = cache.as_ref().and_then(|c| c.entries.get(key).cloned());
        debug!(key, found = hit.is_some(), "directory lookup");
        Ok(hit)
    }
}
