// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for faxline integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic tests without a cloud account or a LINE channel.
//!
//! # Components
//!
//! - [`MockBackend`] - Storage backend recording uploads, revokes and deletes
//! - [`MockNotifier`] - Notifier capturing sent messages
//! - [`TestHarness`] - Relay pipeline and sweeper wired over the mocks

pub mod fixtures;
pub mod harness;
pub mod mock_backend;
pub mod mock_notifier;

pub use fixtures::{MemoryCredentialStore, StaticAuthenticator, StaticDirectory};
pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_backend::MockBackend;
pub use mock_notifier::{MockNotifier, SentNotice};
