// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions at the seams between the relay and its collaborators.
//!
//! Async traits use `#[async_trait]` so they can be held as `Arc<dyn ...>`.

pub mod backend;
pub mod credentials;
pub mod directory;
pub mod notifier;

pub use backend::{RemoteFileStream, StorageBackend};
pub use credentials::{Authenticator, CredentialStore};
pub use directory::DirectorySource;
pub use notifier::Notifier;
