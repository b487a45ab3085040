// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks run after deserialization.

use faxline_core::BackendKind;

use crate::diagnostic::ConfigError;
use crate::model::FaxlineConfig;

/// Minimum sweep period. Shorter periods hammer the listing endpoint.
const MIN_SWEEP_INTERVAL_SECS: u64 = 60;

/// Validate a deserialized configuration.
///
/// Collects every problem instead of stopping at the first one.
pub fn validate_config(config: &FaxlineConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.watch.directory.trim().is_empty() {
        errors.push(ConfigError::MissingKey {
            key: "watch.directory".to_string(),
        });
    }

    let ext = &config.watch.extension;
    if !ext.starts_with('.') || ext.len() < 2 {
        errors.push(ConfigError::validation(format!(
            "watch.extension must start with '.' and name an extension, got `{ext}`"
        )));
    }

    if config.watch.channel_capacity == 0 {
        errors.push(ConfigError::validation(
            "watch.channel_capacity must be at least 1",
        ));
    }

    let folder = config.storage.folder.trim_matches('/');
    if folder.is_empty() {
        errors.push(ConfigError::validation("storage.folder must not be empty"));
    }

    match config.storage.backend {
        BackendKind::OneDrive => {
            if is_blank(config.onedrive.client_id.as_deref()) {
                errors.push(ConfigError::MissingKey {
                    key: "onedrive.client_id".to_string(),
                });
            }
            if config.onedrive.scopes.is_empty() {
                errors.push(ConfigError::validation(
                    "onedrive.scopes must list at least one scope",
                ));
            }
        }
        BackendKind::Dropbox => {
            if is_blank(config.dropbox.app_key.as_deref()) {
                errors.push(ConfigError::MissingKey {
                    key: "dropbox.app_key".to_string(),
                });
            }
            if is_blank(config.dropbox.app_secret.as_deref()) {
                errors.push(ConfigError::MissingKey {
                    key: "dropbox.app_secret".to_string(),
                });
            }
        }
    }

    if is_blank(config.line.channel_access_token.as_deref()) {
        errors.push(ConfigError::MissingKey {
            key: "line.channel_access_token".to_string(),
        });
    }

    if config.identity.suffix_width == 0 {
        errors.push(ConfigError::validation(
            "identity.suffix_width must be greater than 0",
        ));
    }

    if config.retention.threshold_days == 0 {
        errors.push(ConfigError::validation(
            "retention.threshold_days must be at least 1",
        ));
    }

    if config.retention.interval_secs < MIN_SWEEP_INTERVAL_SECS {
        errors.push(ConfigError::validation(format!(
            "retention.interval_secs must be at least {MIN_SWEEP_INTERVAL_SECS}, got {}",
            config.retention.interval_secs
        )));
    }

    if config.relay.journal_path.trim().is_empty() {
        errors.push(ConfigError::validation("relay.journal_path must not be empty"));
    }

    if config.vault.dir.trim().is_empty() {
        errors.push(ConfigError::validation("vault.dir must not be empty"));
    }

    if !matches!(
        config.daemon.log_level.as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        errors.push(ConfigError::validation(format!(
            "daemon.log_level must be one of trace, debug, info, warn, error; got `{}`",
            config.daemon.log_level
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}
