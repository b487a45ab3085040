// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the faxline relay.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type used across all faxline traits and core operations.
///
/// Every variant except [`FaxlineError::Auth`] at startup and
/// [`FaxlineError::Config`] is treated as retryable by the relay pipeline:
/// the file is journaled and attempted again on the next start.
#[derive(Debug, Error)]
pub enum FaxlineError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Upload, listing, folder, or delete request failed.
    #[error("transfer error: {message}")]
    Transfer {
        message: String,
        /// HTTP status returned by the backend, when there was a response.
        status: Option<u16>,
        source: Option<BoxError>,
    },

    /// Share-link creation failed or the response had no link.
    #[error("sharing error: {message}")]
    Sharing { message: String },

    /// Token acquisition or refresh failed.
    #[error("authentication error: {message}")]
    Auth {
        message: String,
        source: Option<BoxError>,
    },

    /// Sender identity could not be derived from a file name.
    #[error("resolution error: {0}")]
    Resolution(String),

    /// The messaging endpoint rejected or never received a notification.
    #[error("notification error: {message}")]
    Notification {
        message: String,
        source: Option<BoxError>,
    },

    /// Reading or writing the retry journal failed.
    #[error("journal error: {source}")]
    Journal { source: std::io::Error },

    /// Credential store errors (missing key, decryption failure, corrupt blob).
    #[error("vault error: {0}")]
    Vault(String),

    /// The filesystem watcher could not be created or attached.
    #[error("watch error: {message}")]
    Watch {
        message: String,
        source: Option<BoxError>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FaxlineError {
    /// Shorthand for a transfer error carrying an HTTP status.
    pub fn transfer_status(status: u16, message: impl Into<String>) -> Self {
        Self::Transfer {
            message: message.into(),
            status: Some(status),
            source: None,
        }
    }

    /// Shorthand for an authentication error without an underlying cause.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true for authentication failures.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    /// HTTP status attached to a transfer error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transfer { status, .. } => *status,
            _ => None,
        }
    }
}
