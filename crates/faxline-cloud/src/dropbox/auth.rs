// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dropbox OAuth2: offline refresh tokens and the no-redirect code flow.

use std::sync::Arc;

use async_trait::async_trait;
use faxline_config::model::DropboxConfig;
use faxline_core::{Authenticator, Credentials, FaxlineError};
use tracing::{info, warn};

use crate::http::post_form;
use crate::oauth::read_token;
use crate::prompt::AuthPrompt;

pub struct DropboxAuthenticator {
    http: reqwest::Client,
    app_key: String,
    app_secret: String,
    token_url: String,
    authorize_url: String,
    prompt: Arc<dyn AuthPrompt>,
}

impl DropboxAuthenticator {
    pub fn new(
        http: reqwest::Client,
        config: &DropboxConfig,
        prompt: Arc<dyn AuthPrompt>,
    ) -> Result<Self, FaxlineError> {
        let app_key = config
            .app_key
            .clone()
            .ok_or_else(|| FaxlineError::Config("dropbox.app_key is not set".into()))?;
        let app_secret = config
            .app_secret
            .clone()
            .ok_or_else(|| FaxlineError::Config("dropbox.app_secret is not set".into()))?;
        Ok(Self {
            http,
            app_key,
            app_secret,
            token_url: format!("{}/token", config.oauth_base.trim_end_matches('/')),
            authorize_url: config.authorize_url.clone(),
            prompt,
        })
    }

    /// Page the operator opens to grant access. Requests an offline
    /// (refreshable) token.
    pub fn authorization_url(&self) -> String {
        format!(
            "{}?client_id={}&response_type=code&token_access_type=offline",
            self.authorize_url,
            urlencoding::encode(&self.app_key)
        )
    }

    /// Exchanges an authorization code pasted by the operator.
    pub async fn exchange_code(&self, code: &str) -> Result<Credentials, FaxlineError> {
        let response = post_form(
            &self.http,
            &self.token_url,
            &[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.app_key.as_str()),
                ("client_secret", self.app_secret.as_str()),
            ],
        )
        .await?;
        let creds = read_token(response, None, "dropbox code exchange").await?;
        info!("dropbox authorization completed");
        Ok(creds)
    }
}

#[async_trait]
impl Authenticator for DropboxAuthenticator {
    async fn refresh(&self, refresh_token: &str) -> Result<Credentials, FaxlineError> {
        let response = post_form(
            &self.http,
            &self.token_url,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.app_key.as_str()),
                ("client_secret", self.app_secret.as_str()),
            ],
        )
        .await?;
        let result = read_token(response, Some(refresh_token), "dropbox refresh").await;
        if let Err(e) = &result {
            warn!(error = %e, "dropbox refresh rejected");
        }
        result
    }

    async fn sign_in(&self) -> Result<Credentials, FaxlineError> {
        let code = self
            .prompt
            .read_authorization_code(&self.authorization_url())
            .await?;
        self.exchange_code(&code).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Paste(&'static str);

    #[async_trait]
    impl AuthPrompt for Paste {
        fn show_device_code(&self, _: &str, _: &str, _: Option<&str>) {}
        async fn read_authorization_code(&self, url: &str) -> Result<String, FaxlineError> {
            assert!(url.contains("token_access_type=offline"));
            Ok(self.0.to_string())
        }
    }

    fn authenticator(server: &MockServer) -> DropboxAuthenticator {
        let config = DropboxConfig {
            app_key: Some("app-key".into()),
            app_secret: Some("app-secret".into()),
            oauth_base: format!("{}/oauth2", server.uri()),
            ..DropboxConfig::default()
        };
        DropboxAuthenticator::new(reqwest::Client::new(), &config, Arc::new(Paste("pasted")))
            .unwrap()
    }

    #[tokio::test]
    async fn first_run_exchanges_pasted_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=pasted"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "sl.abc",
                "expires_in": 14400,
                "refresh_token": "rt-offline",
                "token_type": "bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let creds = authenticator(&server).sign_in().await.unwrap();
        assert_eq!(creds.access_token, "sl.abc");
        assert_eq!(creds.refresh_token.as_deref(), Some("rt-offline"));
    }

    #[tokio::test]
    async fn refresh_keeps_existing_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "sl.new",
                "expires_in": 14400,
                "token_type": "bearer"
            })))
            .mount(&server)
            .await;

        let creds = authenticator(&server)
            .refresh("rt-offline")
            .await
            .unwrap();
        assert_eq!(creds.access_token, "sl.new");
        assert_eq!(creds.refresh_token.as_deref(), Some("rt-offline"));
    }

    #[tokio::test]
    async fn rejected_refresh_does_not_ask_for_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(serde_json::json!({"error": "invalid_grant"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let err = authenticator(&server).refresh("revoked").await.unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn rejected_code_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "code doesn't exist or has expired"
            })))
            .mount(&server)
            .await;

        let err = authenticator(&server).sign_in().await.unwrap_err();
        assert!(err.is_auth());
        assert!(err.to_string().contains("invalid_grant"));
    }
}
