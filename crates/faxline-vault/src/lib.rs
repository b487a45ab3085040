// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encrypted credential storage for the faxline relay.
//!
//! The backend credential (access token, expiry, refresh token) is sealed
//! with AES-256-GCM under a random key kept next to it on disk.

pub mod crypto;
pub mod store;

pub use store::EncryptedFileStore;
