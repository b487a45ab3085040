// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order: `/etc/faxline/faxline.toml`, `~/.config/faxline/faxline.toml`,
//! `./faxline.toml`, then `FAXLINE_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use tracing::debug;

use crate::model::FaxlineConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/faxline/faxline.toml";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "faxline.toml";

/// Top-level sections, used to map `FAXLINE_SECTION_KEY` to `section.key`.
const SECTIONS: &[&str] = &[
    "watch", "storage", "onedrive", "dropbox", "line", "identity", "retention", "relay", "vault",
    "daemon",
];

/// User config file under the XDG config directory, if one can be located.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("faxline").join(LOCAL_CONFIG_FILE))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/faxline/faxline.toml`
/// 3. `~/.config/faxline/faxline.toml`
/// 4. `./faxline.toml`
/// 5. `FAXLINE_*` environment variables
pub fn load_config() -> Result<FaxlineConfig, figment::Error> {
    let candidates = [
        Some(PathBuf::from(SYSTEM_CONFIG_PATH)),
        user_config_path(),
        Some(PathBuf::from(LOCAL_CONFIG_FILE)),
    ];
    for path in candidates.iter().flatten().filter(|p| p.is_file()) {
        debug!(path = %path.display(), "config file found");
    }
    build_figment().extract()
}

/// Parse a TOML string over the compiled defaults. No files, no env.
pub fn load_config_from_str(toml_content: &str) -> Result<FaxlineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FaxlineConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load a single explicit file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FaxlineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FaxlineConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full layered Figment before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(FaxlineConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// `Env::split("_")` would turn `FAXLINE_LINE_CHANNEL_ACCESS_TOKEN` into
/// `line.channel.access.token`; only the first segment names the section.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("FAXLINE_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped env var name to a dotted config key.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_first_section_only() {
        assert_eq!(
            map_env_key("line_channel_access_token"),
            "line.channel_access_token"
        );
        assert_eq!(map_env_key("watch_directory"), "watch.directory");
        assert_eq!(
            map_env_key("retention_threshold_days"),
            "retention.threshold_days"
        );
        assert_eq!(map_env_key("onedrive_client_id"), "onedrive.client_id");
    }

    #[test]
    fn unknown_section_passes_through() {
        assert_eq!(map_env_key("bogus_key"), "bogus_key");
    }
}
