// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LINE Messaging API notifier for the faxline relay.

pub mod client;
pub mod message;

pub use client::LineNotifier;
pub use message::{format_message, FAILURE_TEXT};
