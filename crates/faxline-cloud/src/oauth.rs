// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token-endpoint response handling common to both providers.

use chrono::Utc;
use faxline_core::{Credentials, FaxlineError};
use reqwest::Response;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl TokenResponse {
    /// Providers may omit the refresh token on refresh; the old one stays
    /// valid in that case.
    pub(crate) fn into_credentials(self, previous_refresh: Option<&str>) -> Credentials {
        let refresh = self
            .refresh_token
            .or_else(|| previous_refresh.map(str::to_string));
        Credentials::from_expires_in(self.access_token, self.expires_in, refresh, Utc::now())
    }
}

/// RFC 6749 error body.
#[derive(Debug, Deserialize)]
pub(crate) struct OAuthError {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl OAuthError {
    pub(crate) fn describe(&self) -> String {
        match &self.error_description {
            Some(d) => format!("{}: {d}", self.error),
            None => self.error.clone(),
        }
    }
}

/// Reads a token response, or turns an error body into an auth error.
pub(crate) async fn read_token(
    response: Response,
    previous_refresh: Option<&str>,
    context: &str,
) -> Result<Credentials, FaxlineError> {
    let status = response.status();
    let body = response.text().await.map_err(|e| FaxlineError::Auth {
        message: format!("{context}: cannot read response: {e}"),
        source: Some(Box::new(e)),
    })?;

    if status.is_success() {
        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| FaxlineError::Auth {
            message: format!("{context}: malformed token response: {e}"),
            source: Some(Box::new(e)),
        })?;
        return Ok(token.into_credentials(previous_refresh));
    }

    let detail = serde_json::from_str::<OAuthError>(&body)
        .map(|e| e.describe())
        .unwrap_or(body);
    Err(FaxlineError::auth(format!("{context}: {status}: {detail}")))
}
