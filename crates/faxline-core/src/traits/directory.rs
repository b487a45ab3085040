// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lookup source for fax-number to sender-name mappings.

use crate::error::FaxlineError;

/// Maps a normalized, bracket-delimited fax number to a display name.
pub trait DirectorySource: Send + Sync {
    /// Looks up `key` (for example `[0312345678]`).
    ///
    /// `Ok(None)` is a miss; `Err` means the source itself is unusable.
    fn lookup(&self, key: &str) -> Result<Option<String>, FaxlineError>;
}
