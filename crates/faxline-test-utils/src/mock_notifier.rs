// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock notifier capturing every message for assertion in tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use faxline_core::{FaxlineError, Notifier};
use tokio::sync::Mutex;

/// One captured notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotice {
    pub display_name: String,
    /// `None` for the generic failure notice.
    pub share_link: Option<String>,
}

pub struct MockNotifier {
    sent: Arc<Mutex<Vec<SentNotice>>>,
    failing: AtomicBool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            failing: AtomicBool::new(false),
        }
    }

    /// Makes every later `notify` call fail after recording it.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn sent_messages(&self) -> Vec<SentNotice> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(
        &self,
        display_name: &str,
        share_link: Option<&str>,
    ) -> Result<(), FaxlineError> {
        self.sent.lock().await.push(SentNotice {
            display_name: display_name.to_string(),
            share_link: share_link.map(str::to_string),
        });
        if self.failing.load(Ordering::SeqCst) {
            return Err(FaxlineError::Notification {
                message: "mock notifier is failing".into(),
                source: None,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_links_and_failure_notices() {
        let notifier = MockNotifier::new();
        notifier.notify("Acme Co", Some("https://x")).await.unwrap();
        notifier.set_failing(true);
        assert!(notifier.notify("b.pdf", None).await.is_err());

        let sent = notifier.sent_messages().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].share_link.as_deref(), Some("https://x"));
        assert_eq!(sent[1].share_link, None);
    }
}
