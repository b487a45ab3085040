// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Small in-memory stand-ins for the credential store, the authenticator,
//! and the directory table.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use faxline_core::{Authenticator, CredentialStore, Credentials, DirectorySource, FaxlineError};

#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<Option<Credentials>>,
    saves: AtomicUsize,
}

impl MemoryCredentialStore {
    pub fn with(credentials: Credentials) -> Self {
        Self {
            inner: Mutex::new(Some(credentials)),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<Credentials>, FaxlineError> {
        let guard = self
            .inner
            .lock()
            .map_err(|e| FaxlineError::Vault(e.to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, credentials: &Credentials) -> Result<(), FaxlineError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|e| FaxlineError::Vault(e.to_string()))?;
        *guard = Some(credentials.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Issues a fresh one-hour token on every call and counts the calls.
///
/// [`set_failing`](StaticAuthenticator::set_failing) makes the silent
/// refresh fail with an auth error, as a revoked refresh token would.
#[derive(Default)]
pub struct StaticAuthenticator {
    calls: AtomicUsize,
    sign_ins: AtomicUsize,
    failing: AtomicBool,
}

impl StaticAuthenticator {
    /// Refresh attempts so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sign_ins(&self) -> usize {
        self.sign_ins.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn issue(n: usize) -> Credentials {
        Credentials::from_expires_in(
            format!("static-token-{n}"),
            3600,
            Some("static-refresh".into()),
            Utc::now(),
        )
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn refresh(&self, _refresh_token: &str) -> Result<Credentials, FaxlineError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing.load(Ordering::SeqCst) {
            return Err(FaxlineError::auth("refresh token grant: 400: invalid_grant"));
        }
        Ok(Self::issue(n))
    }

    async fn sign_in(&self) -> Result<Credentials, FaxlineError> {
        let n = self.sign_ins.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Self::issue(n))
    }
}

/// Directory table backed by a map of bracketed keys.
#[derive(Default)]
pub struct StaticDirectory {
    entries: HashMap<String, String>,
}

impl StaticDirectory {
    /// `number` is wrapped in brackets; pass it already normalized.
    pub fn with_entry(mut self, number: &str, name: &str) -> Self {
        self.entries.insert(format!("[{number}]"), name.to_string());
        self
    }
}

impl DirectorySource for StaticDirectory {
    fn lookup(&self, key: &str) -> Result<Option<String>, FaxlineError> {
        Ok(self.entries.get(key).cloned())
    }
}
