// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the faxline relay.
//!
//! TOML files are layered over compiled defaults, `FAXLINE_*` environment
//! variables override them, and every section rejects unknown keys. Errors
//! come back as miette diagnostics with typo suggestions.
//!
//! ```no_run
//! use faxline_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("watching {}", config.watch.directory);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::FaxlineConfig;

/// Load from the standard hierarchy and validate.
pub fn load_and_validate() -> Result<FaxlineConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_toml_sources)
}

/// Load an explicit file (plus env overrides) and validate.
pub fn load_and_validate_path(path: &Path) -> Result<FaxlineConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        std::fs::read_to_string(path)
            .map(|content| vec![(path.display().to_string(), content)])
            .unwrap_or_default()
    })
}

/// Parse a TOML string and validate. Used by tests.
pub fn load_and_validate_str(toml_content: &str) -> Result<FaxlineConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

#[allow(clippy::result_large_err)]
fn finish(
    loaded: Result<FaxlineConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<FaxlineConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Contents of every config file that exists, for source spans.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut candidates = vec![std::path::PathBuf::from(loader::SYSTEM_CONFIG_PATH)];
    candidates.extend(loader::user_config_path());
    candidates.push(
        std::env::current_dir()
            .map(|d| d.join(loader::LOCAL_CONFIG_FILE))
            .unwrap_or_else(|_| loader::LOCAL_CONFIG_FILE.into()),
    );

    candidates
        .into_iter()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}
