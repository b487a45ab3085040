// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential lifecycle shared by the backend and the sweeper.

use std::sync::Arc;

use chrono::{Duration, Utc};
use faxline_core::{Authenticator, CredentialStore, Credentials, FaxlineError};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Hands out access tokens that are valid for at least `margin`.
///
/// Renewal during normal operation is silent: [`get_valid`] and
/// [`force_refresh`] only use the refresh token and fail with an auth error
/// when that is rejected. The interactive flow runs from [`login`] and
/// [`acquire`], never from a request path.
///
/// The state lock is held across renewal, so concurrent callers wait for one
/// refresh instead of starting their own.
///
/// [`get_valid`]: CredentialManager::get_valid
/// [`force_refresh`]: CredentialManager::force_refresh
/// [`login`]: CredentialManager::login
/// [`acquire`]: CredentialManager::acquire
pub struct CredentialManager {
    store: Arc<dyn CredentialStore>,
    authenticator: Arc<dyn Authenticator>,
    margin: Duration,
    state: Mutex<Option<Credentials>>,
}

impl CredentialManager {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        authenticator: Arc<dyn Authenticator>,
        margin: Duration,
    ) -> Self {
        Self {
            store,
            authenticator,
            margin,
            state: Mutex::new(None),
        }
    }

    /// Current credential, silently refreshed first when it expires within
    /// the margin.
    pub async fn get_valid(&self) -> Result<Credentials, FaxlineError> {
        let mut state = self.state.lock().await;
        if state.is_none() {
            *state = self.store.load()?;
        }

        match state.as_ref() {
            None => {
                return Err(FaxlineError::auth(
                    "no stored credentials, run `faxline login`",
                ));
            }
            Some(current) if !current.needs_refresh(Utc::now(), self.margin) => {
                return Ok(current.clone());
            }
            Some(current) => debug!(
                remaining_secs = current.remaining(Utc::now()).num_seconds(),
                "access token inside refresh margin"
            ),
        }

        self.refresh_silently(&mut state).await
    }

    /// Bearer token from [`get_valid`](Self::get_valid).
    pub async fn access_token(&self) -> Result<String, FaxlineError> {
        Ok(self.get_valid().await?.access_token)
    }

    /// Silently refreshes regardless of expiry, for example after a 401.
    pub async fn force_refresh(&self) -> Result<Credentials, FaxlineError> {
        let mut state = self.state.lock().await;
        if state.is_none() {
            *state = self.store.load()?;
        }
        self.refresh_silently(&mut state).await
    }

    /// Runs the interactive flow, ignoring any stored refresh token.
    pub async fn login(&self) -> Result<Credentials, FaxlineError> {
        let mut state = self.state.lock().await;
        let fresh = self.authenticator.sign_in().await?;
        self.persist(&mut state, fresh)
    }

    /// Startup acquisition: the silent path first, then the interactive
    /// flow when there is nothing usable to refresh with.
    pub async fn acquire(&self) -> Result<Credentials, FaxlineError> {
        match self.get_valid().await {
            Err(e) if e.is_auth() => {
                warn!(error = %e, "no usable stored credentials, starting interactive sign-in");
                self.login().await
            }
            other => other,
        }
    }

    async fn refresh_silently(
        &self,
        state: &mut Option<Credentials>,
    ) -> Result<Credentials, FaxlineError> {
        let Some(refresh_token) = state.as_ref().and_then(|c| c.refresh_token.clone()) else {
            return Err(FaxlineError::auth(
                "access token expired and no refresh token is stored, run `faxline login`",
            ));
        };
        let fresh = self.authenticator.refresh(&refresh_token).await?;
        self.persist(state, fresh)
    }

    fn persist(
        &self,
        state: &mut Option<Credentials>,
        fresh: Credentials,
    ) -> Result<Credentials, FaxlineError> {
        self.store.save(&fresh)?;
        info!(expires_at = %fresh.expires_at, "credentials refreshed");
        *state = Some(fresh.clone());
        Ok(fresh)
    }
}
