// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the faxline relay.
//!
//! This crate provides the error type, the shared data model, and the traits
//! every backend, notifier, and credential store implements.

pub mod error;
pub mod traits;
pub mod types;

pub use error::FaxlineError;
pub use types::{
    BackendKind, Credentials, RelayOutcome, RemoteFile, SweepReport, WatchEvent, file_name_of,
};

pub use traits::{
    Authenticator, CredentialStore, DirectorySource, Notifier, RemoteFileStream, StorageBackend,
};
