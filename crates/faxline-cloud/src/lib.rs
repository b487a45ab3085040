// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cloud storage backends for the faxline relay.
//!
//! Two providers implement [`StorageBackend`]: OneDrive (Microsoft Graph) and
//! Dropbox. Both obtain tokens from a shared [`CredentialManager`], which
//! persists them through a [`CredentialStore`] and renews them through the
//! provider's [`Authenticator`].

pub mod dropbox;
mod http;
pub mod manager;
mod oauth;
pub mod onedrive;
pub mod prompt;

use std::sync::Arc;
use std::time::Duration;

use faxline_config::FaxlineConfig;
use faxline_core::{Authenticator, BackendKind, CredentialStore, FaxlineError, StorageBackend};

pub use dropbox::{DropboxAuthenticator, DropboxBackend};
pub use manager::CredentialManager;
pub use onedrive::{GraphAuthenticator, OneDriveBackend};
pub use prompt::{AuthPrompt, ConsolePrompt};

/// A configured backend and the credential manager it draws tokens from.
pub struct CloudHandle {
    pub backend: Arc<dyn StorageBackend>,
    pub credentials: Arc<CredentialManager>,
}

/// Builds the backend selected by `storage.backend`.
pub fn build_backend(
    config: &FaxlineConfig,
    store: Arc<dyn CredentialStore>,
    prompt: Arc<dyn AuthPrompt>,
) -> Result<CloudHandle, FaxlineError> {
    let http = http::build_client(Duration::from_secs(config.storage.request_timeout_secs))?;
    let margin = chrono::Duration::seconds(
        i64::try_from(config.storage.refresh_margin_secs).unwrap_or(i64::MAX / 1000),
    );

    let authenticator: Arc<dyn Authenticator> = match config.storage.backend {
        BackendKind::OneDrive => Arc::new(GraphAuthenticator::new(
            http.clone(),
            &config.onedrive,
            prompt,
        )?),
        BackendKind::Dropbox => Arc::new(DropboxAuthenticator::new(
            http.clone(),
            &config.dropbox,
            prompt,
        )?),
    };
    let credentials = Arc::new(CredentialManager::new(store, authenticator, margin));

    let backend: Arc<dyn StorageBackend> = match config.storage.backend {
        BackendKind::OneDrive => Arc::new(OneDriveBackend::new(
            http,
            credentials.clone(),
            config.onedrive.api_base.clone(),
        )),
        BackendKind::Dropbox => Arc::new(DropboxBackend::new(
            http,
            credentials.clone(),
            config.dropbox.api_base.clone(),
            config.dropbox.content_base.clone(),
        )),
    };

    Ok(CloudHandle {
        backend,
        credentials,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use faxline_core::Credentials;

    struct Empty;

    impl CredentialStore for Empty {
        fn load(&self) -> Result<Option<Credentials>, FaxlineError> {
            Ok(None)
        }
        fn save(&self, _: &Credentials) -> Result<(), FaxlineError> {
            Ok(())
        }
    }

    #[test]
    fn selects_backend_by_kind() {
        let mut config = FaxlineConfig::default();
        config.onedrive.client_id = Some("client".into());
        let handle = build_backend(&config, Arc::new(Empty), Arc::new(ConsolePrompt)).unwrap();
        assert_eq!(handle.backend.name(), "onedrive");

        config.storage.backend = BackendKind::Dropbox;
        config.dropbox.app_key = Some("key".into());
        config.dropbox.app_secret = Some("secret".into());
        let handle = build_backend(&config, Arc::new(Empty), Arc::new(ConsolePrompt)).unwrap();
        assert_eq!(handle.backend.name(), "dropbox");
    }

    #[test]
    fn missing_provider_credentials_rejected() {
        let mut config = FaxlineConfig::default();
        config.storage.backend = BackendKind::Dropbox;
        assert!(build_backend(&config, Arc::new(Empty), Arc::new(ConsolePrompt)).is_err());
    }
}
