// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File name to sender display name.

use std::sync::Arc;

use faxline_core::{DirectorySource, FaxlineError};
use tracing::warn;

use crate::normalize::{directory_key, normalize_number, to_halfwidth};

/// Derives a sender label from the scanner's file naming scheme
/// `<sender><separator><timestamp><extension>`.
pub struct IdentityResolver {
    directory: Option<Arc<dyn DirectorySource>>,
    suffix_width: usize,
}

impl IdentityResolver {
    /// `suffix_width` counts characters, not bytes.
    pub fn new(directory: Option<Arc<dyn DirectorySource>>, suffix_width: usize) -> Self {
        Self {
            directory,
            suffix_width,
        }
    }

    /// Display name for `file_name`, or `None` when it cannot be derived.
    ///
    /// A `None` means the caller should show the raw file name.
    pub fn resolve(&self, file_name: &str) -> Option<String> {
        match self.try_resolve(file_name) {
            Ok(name) => Some(name),
            Err(e) => {
                warn!(file_name, error = %e, "sender resolution failed");
                None
            }
        }
    }

    fn try_resolve(&self, file_name: &str) -> Result<String, FaxlineError> {
        let label = self.strip_suffix(file_name)?;

        let starts_with_digit = label
            .chars()
            .next()
            .map(to_halfwidth)
            .is_some_and(|c| c.is_ascii_digit());
        if !starts_with_digit {
            return Ok(label.to_string());
        }

        let number = normalize_number(label);
        let Some(directory) = &self.directory else {
            return Ok(number);
        };
        Ok(directory
            .lookup(&directory_key(&number))?
            .unwrap_or(number))
    }

    fn strip_suffix<'a>(&self, file_name: &'a str) -> Result<&'a str, FaxlineError> {
        let chars = file_name.chars().count();
        if chars <= self.suffix_width {
            return Err(FaxlineError::Resolution(format!(
                "`{file_name}` is not longer than the {}-character suffix",
                self.suffix_width
            )));
        }
        let cut = file_name
            .char_indices()
            .nth(chars - self.suffix_width)
            .map_or(file_name.len(), |(i, _)| i);
        let label = file_name[..cut].trim();
        if label.is_empty() {
            return Err(FaxlineError::Resolution(format!(
                "`{file_name}` has an empty sender label"
            )));
        }
        Ok(label)
    }
}
