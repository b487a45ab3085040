// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification channel trait.

use async_trait::async_trait;

use crate::error::FaxlineError;

/// Announces relayed documents to people.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends one message for `display_name`.
    ///
    /// With `share_link == None` the message is the generic failure notice.
    async fn notify(
        &self,
        display_name: &str,
        share_link: Option<&str>,
    ) -> Result<(), FaxlineError>;
}
