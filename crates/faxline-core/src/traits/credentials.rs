// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential persistence and acquisition traits.

use async_trait::async_trait;

use crate::error::FaxlineError;
use crate::types::Credentials;

/// Durable storage for the backend credential.
pub trait CredentialStore: Send + Sync {
    /// Returns the stored credential, or `None` before the first login.
    fn load(&self) -> Result<Option<Credentials>, FaxlineError>;

    /// Replaces the stored credential.
    fn save(&self, credentials: &Credentials) -> Result<(), FaxlineError>;
}

/// Obtains fresh credentials from an OAuth provider.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Silent renewal with a refresh token. Never prompts the operator.
    async fn refresh(&self, refresh_token: &str) -> Result<Credentials, FaxlineError>;

    /// Interactive sign-in (device code or pasted authorization code).
    ///
    /// Blocks until the operator finishes or the flow expires.
    async fn sign_in(&self) -> Result<Credentials, FaxlineError>;
}
