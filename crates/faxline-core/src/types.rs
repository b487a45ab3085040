// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the backends, the resolver, and the relay pipeline.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// OAuth credentials for the storage backend.
///
/// `expires_at` is the only authority for expiry decisions. Time elapsed since
/// process start is never consulted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    /// Long-lived token used for the silent refresh path.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Credentials {
    /// Builds credentials from a token-endpoint `expires_in` value.
    pub fn from_expires_in(
        access_token: String,
        expires_in_secs: i64,
        refresh_token: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token,
            expires_at: now + Duration::seconds(expires_in_secs),
            refresh_token,
        }
    }

    /// Seconds of lifetime left at `now` (negative once expired).
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }

    /// True when the remaining lifetime is below `margin`.
    ///
    /// Refresh happens ahead of expiry so a request never starts with a token
    /// that expires mid-call.
    pub fn needs_refresh(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.remaining(now) < margin
    }
}

/// A file stored on the remote backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Backend-specific identifier (Graph item id, Dropbox `id:` path).
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub parent_folder: String,
}

impl RemoteFile {
    /// Age in whole days at `now`, rounded down.
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_days()
    }
}

/// A filesystem event delivered by the watcher, consumed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub is_directory: bool,
}

impl WatchEvent {
    /// Event for a regular file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_directory: false,
        }
    }

    /// The final path component as UTF-8, if it has one.
    pub fn file_name(&self) -> Option<&str> {
        file_name_of(&self.path)
    }
}

/// Returns the last component of `path` as a string slice.
pub fn file_name_of(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

/// Which cloud provider the relay talks to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BackendKind {
    #[serde(alias = "one_drive")]
    OneDrive,
    Dropbox,
}

/// Terminal state of one detected event in the relay pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Directory, wrong extension, or unusable path.
    Ignored,
    /// The basename was already taken earlier in this run.
    Duplicate,
    /// Uploaded, linked, and announced.
    Done { display_name: String, link: String },
    /// Appended to the retry journal for the next start.
    Journaled,
}

/// Result of one retention sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub deleted: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn refresh_triggered_inside_margin() {
        let now = ts("2026-03-01T00:00:00Z");
        let margin = Duration::seconds(300);
        let soon = Credentials {
            access_token: "a".into(),
            expires_at: now + Duration::seconds(200),
            refresh_token: None,
        };
        let later = Credentials {
            access_token: "a".into(),
            expires_at: now + Duration::seconds(400),
            refresh_token: None,
        };
        assert!(soon.needs_refresh(now, margin));
        assert!(!later.needs_refresh(now, margin));
    }

    #[test]
    fn expired_credentials_need_refresh() {
        let now = ts("2026-03-01T00:00:00Z");
        let creds = Credentials::from_expires_in("a".into(), -10, None, now);
        assert!(creds.needs_refresh(now, Duration::zero()));
    }

    #[test]
    fn age_days_rounds_down() {
        let now = ts("2026-03-08T00:00:00Z");
        let file = RemoteFile {
            id: "1".into(),
            name: "a.pdf".into(),
            created_at: ts("2026-03-01T01:00:00Z"),
            parent_folder: "FAX".into(),
        };
        assert_eq!(file.age_days(now), 6);
    }

    #[test]
    fn debug_redacts_tokens() {
        let creds = Credentials {
            access_token: "secret-access".into(),
            expires_at: ts("2026-03-01T00:00:00Z"),
            refresh_token: Some("secret-refresh".into()),
        };
        let printed = format!("{creds:?}");
        assert!(!printed.contains("secret-access"));
        assert!(!printed.contains("secret-refresh"));
    }

    #[test]
    fn credentials_without_refresh_token_deserialize() {
        let json = r#"{"access_token":"tok","expires_at":"2026-03-01T00:00:00Z"}"#;
        let creds: Credentials = serde_json::from_str(json).unwrap();
        assert_eq!(creds.access_token, "tok");
        assert!(creds.refresh_token.is_none());
    }

    #[test]
    fn backend_kind_parses_lowercase() {
        use std::str::FromStr;
        assert_eq!(BackendKind::from_str("onedrive").unwrap(), BackendKind::OneDrive);
        assert_eq!(BackendKind::from_str("dropbox").unwrap(), BackendKind::Dropbox);
        assert_eq!(BackendKind::OneDrive.to_string(), "onedrive");
    }
}
