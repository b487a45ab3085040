// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the LINE Messaging API broadcast endpoint.

use std::time::Duration;

use async_trait::async_trait;
use faxline_config::FaxlineConfig;
use faxline_core::{FaxlineError, Notifier};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::message::{ApiErrorResponse, BroadcastRequest, format_message};

/// Broadcasts one text message per relayed document to every follower of
/// the channel.
#[derive(Debug, Clone)]
pub struct LineNotifier {
    client: reqwest::Client,
    endpoint: String,
    retention_days: u32,
}

impl LineNotifier {
    pub fn new(
        channel_access_token: SecretString,
        endpoint: impl Into<String>,
        retention_days: u32,
    ) -> Result<Self, FaxlineError> {
        let mut auth = HeaderValue::from_str(&format!(
            "Bearer {}",
            channel_access_token.expose_secret()
        ))
        .map_err(|e| FaxlineError::Config(format!("invalid LINE access token: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FaxlineError::Notification {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            retention_days,
        })
    }

    /// Builds the notifier from the `[line]` and `[retention]` sections.
    pub fn from_config(config: &FaxlineConfig) -> Result<Self, FaxlineError> {
        let token = config
            .line
            .channel_access_token
            .clone()
            .ok_or_else(|| FaxlineError::Config("line.channel_access_token is not set".into()))?;
        Self::new(
            SecretString::from(token),
            config.line.endpoint.clone(),
            config.retention.threshold_days,
        )
    }

    /// Posts `text` as a single broadcast message.
    pub async fn broadcast(&self, text: String) -> Result<(), FaxlineError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&BroadcastRequest::text(text))
            .send()
            .await
            .map_err(|e| FaxlineError::Notification {
                message: format!("broadcast request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, "broadcast response received");
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ApiErrorResponse>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        Err(FaxlineError::Notification {
            message: format!("LINE returned {status}: {detail}"),
            source: None,
        })
    }
}

#[async_trait]
impl Notifier for LineNotifier {
    async fn notify(
        &self,
        display_name: &str,
        share_link: Option<&str>,
    ) -> Result<(), FaxlineError> {
        self.broadcast(format_message(display_name, share_link, self.retention_days))
            .await?;
        info!(display_name, linked = share_link.is_some(), "notification sent");
        Ok(())
    }
}
