// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the faxline relay.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use faxline_core::BackendKind;
use serde::{Deserialize, Serialize};

/// Top-level faxline configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. Every section has defaults except `watch.directory` and the
/// provider credentials, which validation requires.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FaxlineConfig {
    /// Watched scan directory.
    #[serde(default)]
    pub watch: WatchConfig,

    /// Backend selection and destination folder.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Microsoft Graph (OneDrive) settings.
    #[serde(default)]
    pub onedrive: OneDriveConfig,

    /// Dropbox settings.
    #[serde(default)]
    pub dropbox: DropboxConfig,

    /// LINE Messaging API settings.
    #[serde(default)]
    pub line: LineConfig,

    /// Sender identity resolution.
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Remote retention sweep.
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Relay pipeline and retry journal.
    #[serde(default)]
    pub relay: RelayConfig,

    /// Encrypted credential store location.
    #[serde(default)]
    pub vault: VaultConfig,

    /// Process-level settings.
    #[serde(default)]
    pub daemon: DaemonConfig,
}

/// Watched directory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    /// Directory the scanner drops documents into. Required.
    #[serde(default)]
    pub directory: String,

    /// Only files ending in this extension are relayed (case-insensitive).
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Delay before reading a newly created file, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Capacity of the queue between the watcher thread and the worker.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            directory: String::new(),
            extension: default_extension(),
            debounce_ms: default_debounce_ms(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_extension() -> String {
    ".pdf".to_string()
}

fn default_debounce_ms() -> u64 {
    3000
}

fn default_channel_capacity() -> usize {
    128
}

/// Storage backend selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Which provider to use: `onedrive` or `dropbox`.
    #[serde(default = "default_backend")]
    pub backend: BackendKind,

    /// Remote destination folder, relative to the drive root.
    #[serde(default = "default_folder")]
    pub folder: String,

    /// Refresh the access token when less than this many seconds remain.
    #[serde(default = "default_refresh_margin_secs")]
    pub refresh_margin_secs: u64,

    /// Timeout for a single HTTP request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            folder: default_folder(),
            refresh_margin_secs: default_refresh_margin_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_backend() -> BackendKind {
    BackendKind::OneDrive
}

fn default_folder() -> String {
    "FAX".to_string()
}

fn default_refresh_margin_secs() -> u64 {
    300
}

fn default_request_timeout_secs() -> u64 {
    120
}

/// Microsoft Graph configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OneDriveConfig {
    /// Azure app registration client id. Required for the OneDrive backend.
    #[serde(default)]
    pub client_id: Option<String>,

    /// OAuth authority. `consumers` is the personal-account endpoint.
    #[serde(default = "default_authority")]
    pub authority: String,

    /// Delegated permission scopes requested at login.
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    /// Graph API root.
    #[serde(default = "default_graph_base")]
    pub api_base: String,
}

impl Default for OneDriveConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            authority: default_authority(),
            scopes: default_scopes(),
            api_base: default_graph_base(),
        }
    }
}

fn default_authority() -> String {
    "https://login.microsoftonline.com/consumers".to_string()
}

fn default_scopes() -> Vec<String> {
    vec![
        "Files.ReadWrite.All".to_string(),
        "offline_access".to_string(),
    ]
}

fn default_graph_base() -> String {
    "https://graph.microsoft.com/v1.0".to_string()
}

/// Dropbox configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DropboxConfig {
    /// Dropbox app key. Required for the Dropbox backend.
    #[serde(default)]
    pub app_key: Option<String>,

    /// Dropbox app secret. Required for the Dropbox backend.
    #[serde(default)]
    pub app_secret: Option<String>,

    /// RPC endpoint root.
    #[serde(default = "default_dropbox_api_base")]
    pub api_base: String,

    /// Content (upload) endpoint root.
    #[serde(default = "default_dropbox_content_base")]
    pub content_base: String,

    /// OAuth token endpoint root.
    #[serde(default = "default_dropbox_oauth_base")]
    pub oauth_base: String,

    /// Browser authorization page.
    #[serde(default = "default_dropbox_authorize_url")]
    pub authorize_url: String,
}

impl Default for DropboxConfig {
    fn default() -> Self {
        Self {
            app_key: None,
            app_secret: None,
            api_base: default_dropbox_api_base(),
            content_base: default_dropbox_content_base(),
            oauth_base: default_dropbox_oauth_base(),
            authorize_url: default_dropbox_authorize_url(),
        }
    }
}

fn default_dropbox_api_base() -> String {
    "https://api.dropboxapi.com/2".to_string()
}

fn default_dropbox_content_base() -> String {
    "https://content.dropboxapi.com/2".to_string()
}

fn default_dropbox_oauth_base() -> String {
    "https://api.dropboxapi.com/oauth2".to_string()
}

fn default_dropbox_authorize_url() -> String {
    "https://www.dropbox.com/oauth2/authorize".to_string()
}

/// LINE Messaging API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LineConfig {
    /// Long-lived channel access token. Required.
    #[serde(default)]
    pub channel_access_token: Option<String>,

    /// Broadcast endpoint.
    #[serde(default = "default_line_endpoint")]
    pub endpoint: String,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            channel_access_token: None,
            endpoint: default_line_endpoint(),
        }
    }
}

fn default_line_endpoint() -> String {
    "https://api.line.me/v2/bot/message/broadcast".to_string()
}

/// Sender identity resolution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    /// Workbook (`.xlsx`, `.xls`, `.ods`, first sheet) or CSV file mapping fax
    /// numbers to names. `None` disables lookups.
    #[serde(default)]
    pub directory_path: Option<String>,

    /// Header of the fax-number column.
    #[serde(default = "default_fax_column")]
    pub fax_column: String,

    /// Header of the display-name column.
    #[serde(default = "default_name_column")]
    pub name_column: String,

    /// Characters the scanner appends after the sender label
    /// (separator, timestamp, and extension).
    #[serde(default = "default_suffix_width")]
    pub suffix_width: usize,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            directory_path: None,
            fax_column: default_fax_column(),
            name_column: default_name_column(),
            suffix_width: default_suffix_width(),
        }
    }
}

fn default_fax_column() -> String {
    "FAX".to_string()
}

fn default_name_column() -> String {
    "Name".to_string()
}

fn default_suffix_width() -> usize {
    19 // "_" + YYYYMMDDhhmmss + ".pdf"
}

/// Retention sweep configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionConfig {
    /// Run the sweeper at all.
    #[serde(default = "default_retention_enabled")]
    pub enabled: bool,

    /// Files at least this many whole days old are unshared and deleted.
    #[serde(default = "default_threshold_days")]
    pub threshold_days: u32,

    /// Period between sweeps, in seconds.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Sweep once immediately at startup instead of waiting one period.
    #[serde(default = "default_run_on_startup")]
    pub run_on_startup: bool,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: default_retention_enabled(),
            threshold_days: default_threshold_days(),
            interval_secs: default_interval_secs(),
            run_on_startup: default_run_on_startup(),
        }
    }
}

fn default_retention_enabled() -> bool {
    true
}

fn default_threshold_days() -> u32 {
    7
}

fn default_interval_secs() -> u64 {
    86_400 // 24 hours
}

fn default_run_on_startup() -> bool {
    true
}

/// Relay pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    /// Retry journal file, one pending path per line.
    #[serde(default = "default_journal_path")]
    pub journal_path: String,

    /// Also send the generic failure text when a relay fails.
    #[serde(default)]
    pub notify_on_failure: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            journal_path: default_journal_path(),
            notify_on_failure: false,
        }
    }
}

fn default_journal_path() -> String {
    data_path("unsent.txt")
}

/// Credential store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Directory holding `secret.key` and `credentials.enc`.
    #[serde(default = "default_vault_dir")]
    pub dir: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            dir: default_vault_dir(),
        }
    }
}

fn default_vault_dir() -> String {
    data_path("secrets")
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Also append logs to this file.
    #[serde(default)]
    pub log_file: Option<String>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn data_path(name: &str) -> String {
    dirs::data_dir()
        .map(|p| p.join("faxline").join(name))
        .unwrap_or_else(|| std::path::PathBuf::from(name))
        .to_string_lossy()
        .into_owned()
}
