// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast request body and notification text.

use serde::{Deserialize, Serialize};

/// Body of `POST /v2/bot/message/broadcast`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BroadcastRequest {
    pub messages: Vec<TextMessage>,
}

impl BroadcastRequest {
    pub fn text(text: String) -> Self {
        Self {
            messages: vec![TextMessage {
                kind: "text".to_string(),
                text,
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

/// Error body returned by the Messaging API.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub message: String,
}

/// Sent when a relay failed and there is no link to share.
pub const FAILURE_TEXT: &str = "エラーが発生しました。";

/// Notification text for a relayed document.
pub fn format_message(display_name: &str, share_link: Option<&str>, retention_days: u32) -> String {
    match share_link {
        Some(link) => format!(
            "新しいFAXが届きました:\n{display_name}\n{link}\n閲覧可能期間は{retention_days}日間"
        ),
        None => FAILURE_TEXT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_with_link() {
        assert_eq!(
            format_message("Acme Co", Some("https://1drv.ms/b/abc"), 7),
            "新しいFAXが届きました:\nAcme Co\nhttps://1drv.ms/b/abc\n閲覧可能期間は7日間"
        );
    }

    #[test]
    fn message_without_link_is_generic_failure() {
        assert_eq!(format_message("Acme Co", None, 7), FAILURE_TEXT);
    }

    #[test]
    fn request_serializes_type_field() {
        let body = serde_json::to_value(BroadcastRequest::text("hi".into())).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"messages": [{"type": "text", "text": "hi"}]})
        );
    }
}
