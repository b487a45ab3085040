// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Microsoft identity platform: refresh-token grant and device-code flow.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use faxline_config::model::OneDriveConfig;
use faxline_core::{Authenticator, Credentials, FaxlineError};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::http::post_form;
use crate::oauth::{OAuthError, read_token};
use crate::prompt::AuthPrompt;

const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Extra wait the server asks for on `slow_down`.
const SLOW_DOWN_STEP: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    verification_uri: String,
    expires_in: u64,
    #[serde(default = "default_poll_interval")]
    interval: u64,
    #[serde(default)]
    message: Option<String>,
}

fn default_poll_interval() -> u64 {
    5
}

/// Delegated-permission authenticator for personal Microsoft accounts.
pub struct GraphAuthenticator {
    http: reqwest::Client,
    client_id: String,
    authority: String,
    scope: String,
    prompt: Arc<dyn AuthPrompt>,
}

impl GraphAuthenticator {
    pub fn new(
        http: reqwest::Client,
        config: &OneDriveConfig,
        prompt: Arc<dyn AuthPrompt>,
    ) -> Result<Self, FaxlineError> {
        let client_id = config
            .client_id
            .clone()
            .ok_or_else(|| FaxlineError::Config("onedrive.client_id is not set".into()))?;
        Ok(Self {
            http,
            client_id,
            authority: config.authority.trim_end_matches('/').to_string(),
            scope: config.scopes.join(" "),
            prompt,
        })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/oauth2/v2.0/{name}", self.authority)
    }

    /// Interactive path: shows a user code and polls until sign-in completes.
    pub async fn device_code(&self) -> Result<Credentials, FaxlineError> {
        let response = post_form(
            &self.http,
            &self.endpoint("devicecode"),
            &[
                ("client_id", self.client_id.as_str()),
                ("scope", self.scope.as_str()),
            ],
        )
        .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FaxlineError::auth(format!(
                "device code request failed: {status}: {body}"
            )));
        }
        let flow: DeviceCodeResponse = response.json().await.map_err(|e| FaxlineError::Auth {
            message: format!("malformed device code response: {e}"),
            source: Some(Box::new(e)),
        })?;

        self.prompt
            .show_device_code(&flow.verification_uri, &flow.user_code, flow.message.as_deref());

        let deadline = tokio::time::Instant::now() + Duration::from_secs(flow.expires_in);
        let mut interval = Duration::from_secs(flow.interval);
        loop {
            tokio::time::sleep(interval).await;
            if tokio::time::Instant::now() >= deadline {
                return Err(FaxlineError::auth("device code expired before sign-in"));
            }

            let response = post_form(
                &self.http,
                &self.endpoint("token"),
                &[
                    ("client_id", self.client_id.as_str()),
                    ("grant_type", DEVICE_CODE_GRANT),
                    ("device_code", flow.device_code.as_str()),
                ],
            )
            .await?;

            if response.status().is_success() {
                let creds = read_token(response, None, "device code grant").await?;
                info!("device code sign-in completed");
                return Ok(creds);
            }

            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = serde_json::from_str::<OAuthError>(&body).map_err(|_| {
                FaxlineError::auth(format!("device code polling failed: {status}: {body}"))
            })?;
            match error.error.as_str() {
                "authorization_pending" => debug!("waiting for device code sign-in"),
                "slow_down" => interval += SLOW_DOWN_STEP,
                _ => {
                    return Err(FaxlineError::auth(format!(
                        "device code sign-in failed: {}",
                        error.describe()
                    )));
                }
            }
        }
    }
}

#[async_trait]
impl Authenticator for GraphAuthenticator {
    async fn refresh(&self, refresh_token: &str) -> Result<Credentials, FaxlineError> {
        let response = post_form(
            &self.http,
            &self.endpoint("token"),
            &[
                ("client_id", self.client_id.as_str()),
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("scope", self.scope.as_str()),
            ],
        )
        .await?;
        let result = read_token(response, Some(refresh_token), "refresh token grant").await;
        if let Err(e) = &result {
            warn!(error = %e, "silent refresh rejected");
        }
        result
    }

    async fn sign_in(&self) -> Result<Credentials, FaxlineError> {
        self.device_code().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct RecordingPrompt(Mutex<Vec<String>>);

    #[async_trait]
    impl AuthPrompt for RecordingPrompt {
        fn show_device_code(&self, _uri: &str, user_code: &str, _message: Option<&str>) {
            self.0.lock().unwrap().push(user_code.to_string());
        }
        async fn read_authorization_code(&self, _url: &str) -> Result<String, FaxlineError> {
            Err(FaxlineError::auth("not used"))
        }
    }

    fn authenticator(server: &MockServer, prompt: Arc<RecordingPrompt>) -> GraphAuthenticator {
        let config = OneDriveConfig {
            client_id: Some("client-1".into()),
            authority: format!("{}/consumers", server.uri()),
            ..OneDriveConfig::default()
        };
        GraphAuthenticator::new(reqwest::Client::new(), &config, prompt).unwrap()
    }

    fn token(access: &str, refresh: Option<&str>) -> serde_json::Value {
        let mut body = serde_json::json!({
            "token_type": "Bearer",
            "access_token": access,
            "expires_in": 3600,
        });
        if let Some(r) = refresh {
            body["refresh_token"] = serde_json::json!(r);
        }
        body
    }

    #[tokio::test]
    async fn refresh_grant_keeps_old_refresh_token_when_omitted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/consumers/oauth2/v2.0/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=rt-old"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token("at-new", None)))
            .expect(1)
            .mount(&server)
            .await;

        let auth = authenticator(&server, Arc::default());
        let creds = auth.refresh("rt-old").await.unwrap();
        assert_eq!(creds.access_token, "at-new");
        assert_eq!(creds.refresh_token.as_deref(), Some("rt-old"));
    }

    #[tokio::test]
    async fn device_code_polls_through_pending() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/consumers/oauth2/v2.0/devicecode"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "device_code": "dev-1",
                "user_code": "ABCD-EFGH",
                "verification_uri": "https://microsoft.com/devicelogin",
                "expires_in": 900,
                "interval": 0,
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/consumers/oauth2/v2.0/token"))
            .and(body_string_contains("device_code=dev-1"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"error": "authorization_pending"})),
            )
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/consumers/oauth2/v2.0/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(token("at-device", Some("rt-device"))),
            )
            .mount(&server)
            .await;

        let prompt = Arc::new(RecordingPrompt::default());
        let creds = authenticator(&server, prompt.clone())
            .sign_in()
            .await
            .unwrap();
        assert_eq!(creds.access_token, "at-device");
        assert_eq!(creds.refresh_token.as_deref(), Some("rt-device"));
        assert_eq!(*prompt.0.lock().unwrap(), vec!["ABCD-EFGH".to_string()]);
    }

    #[tokio::test]
    async fn rejected_refresh_never_starts_device_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/consumers/oauth2/v2.0/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(serde_json::json!({"error": "invalid_grant"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/consumers/oauth2/v2.0/devicecode"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let prompt = Arc::new(RecordingPrompt::default());
        let err = authenticator(&server, prompt.clone())
            .refresh("revoked")
            .await
            .unwrap_err();
        assert!(err.is_auth());
        assert!(err.to_string().contains("invalid_grant"));
        assert!(prompt.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn declined_sign_in_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/consumers/oauth2/v2.0/devicecode"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "device_code": "dev-3",
                "user_code": "NOPE",
                "verification_uri": "https://microsoft.com/devicelogin",
                "expires_in": 900,
                "interval": 0,
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/consumers/oauth2/v2.0/token"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"error": "authorization_declined"})),
            )
            .mount(&server)
            .await;

        let err = authenticator(&server, Arc::default())
            .sign_in()
            .await
            .unwrap_err();
        assert!(err.is_auth());
    }
}
