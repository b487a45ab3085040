// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator interaction during interactive OAuth flows.

use std::io::IsTerminal;

use async_trait::async_trait;
use faxline_core::FaxlineError;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Shows sign-in instructions and collects authorization codes.
#[async_trait]
pub trait AuthPrompt: Send + Sync {
    /// Displays device-code instructions. The flow polls until the user
    /// completes sign-in elsewhere.
    fn show_device_code(&self, verification_uri: &str, user_code: &str, message: Option<&str>);

    /// Displays `authorize_url` and returns the code the user pastes back.
    async fn read_authorization_code(&self, authorize_url: &str) -> Result<String, FaxlineError>;
}

/// Prompt on stderr/stdin. Refuses to block when stdin is not a terminal,
/// so a daemon without credentials fails fast instead of hanging.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsolePrompt;

#[async_trait]
impl AuthPrompt for ConsolePrompt {
    fn show_device_code(&self, verification_uri: &str, user_code: &str, message: Option<&str>) {
        match message {
            Some(message) => eprintln!("{message}"),
            None => eprintln!("To sign in, open {verification_uri} and enter the code {user_code}"),
        }
    }

    async fn read_authorization_code(&self, authorize_url: &str) -> Result<String, FaxlineError> {
        if !std::io::stdin().is_terminal() {
            return Err(FaxlineError::auth(
                "interactive login required; run `faxline login` from a terminal",
            ));
        }

        eprintln!("1. Open {authorize_url}");
        eprintln!("2. Click \"Allow\" (you might have to log in first).");
        eprint!("3. Paste the authorization code here: ");

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(|e| FaxlineError::Auth {
                message: format!("failed to read authorization code: {e}"),
                source: Some(Box::new(e)),
            })?;

        let code = line.trim();
        if code.is_empty() {
            return Err(FaxlineError::auth("empty authorization code"));
        }
        Ok(code.to_string())
    }
}
