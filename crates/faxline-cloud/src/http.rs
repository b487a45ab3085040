// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request plumbing shared by both providers.

use std::sync::Arc;
use std::time::Duration;

use faxline_core::FaxlineError;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::manager::CredentialManager;

/// Content type of OAuth token requests.
pub(crate) const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, FaxlineError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| FaxlineError::Internal(format!("failed to build HTTP client: {e}")))
}

/// Authorized requests with one re-authentication on 401.
pub(crate) struct ApiClient {
    http: reqwest::Client,
    credentials: Arc<CredentialManager>,
}

impl ApiClient {
    pub(crate) fn new(http: reqwest::Client, credentials: Arc<CredentialManager>) -> Self {
        Self { http, credentials }
    }

    pub(crate) fn credentials(&self) -> &Arc<CredentialManager> {
        &self.credentials
    }

    /// Sends the request `build` produces with a bearer token.
    ///
    /// `build` runs again after a forced refresh if the first attempt is
    /// rejected with 401.
    pub(crate) async fn send<F>(&self, build: F) -> Result<Response, FaxlineError>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let token = self.credentials.access_token().await?;
        let response = build(&self.http)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(transport)?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        warn!(url = %response.url(), "access token rejected, refreshing");
        let fresh = self.credentials.force_refresh().await?;
        build(&self.http)
            .bearer_auth(&fresh.access_token)
            .send()
            .await
            .map_err(transport)
    }
}

pub(crate) fn transport(e: reqwest::Error) -> FaxlineError {
    FaxlineError::Transfer {
        message: format!("HTTP request failed: {e}"),
        status: e.status().map(|s| s.as_u16()),
        source: Some(Box::new(e)),
    }
}

/// Converts a non-success response into a transfer error carrying its status.
pub(crate) async fn status_error(response: Response, context: &str) -> FaxlineError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    FaxlineError::transfer_status(status.as_u16(), format!("{context}: {status}: {body}"))
}

/// Parses a JSON body, mapping failures to a transfer error.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: Response,
    context: &str,
) -> Result<T, FaxlineError> {
    response.json::<T>().await.map_err(|e| FaxlineError::Transfer {
        message: format!("{context}: malformed response: {e}"),
        status: None,
        source: Some(Box::new(e)),
    })
}

/// `application/x-www-form-urlencoded` body for a token request.
pub(crate) fn form_body<T: Serialize + ?Sized>(fields: &T) -> Result<String, FaxlineError> {
    serde_urlencoded::to_string(fields)
        .map_err(|e| FaxlineError::Internal(format!("cannot encode form body: {e}")))
}

/// Posts a form to an OAuth endpoint without bearer auth.
pub(crate) async fn post_form<T: Serialize + ?Sized>(
    http: &reqwest::Client,
    url: &str,
    fields: &T,
) -> Result<Response, FaxlineError> {
    http.post(url)
        .header(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE))
        .body(form_body(fields)?)
        .send()
        .await
        .map_err(|e| FaxlineError::Auth {
            message: format!("token request failed: {e}"),
            source: Some(Box::new(e)),
        })
}

/// Percent-encodes each `/`-separated segment of a drive path.
pub(crate) fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| urlencoding::encode(s).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
