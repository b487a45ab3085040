// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage backend trait implemented by each cloud provider.

use std::path::Path;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::FaxlineError;
use crate::types::{Credentials, RemoteFile};

/// Lazily paged listing of remote files.
pub type RemoteFileStream<'a> = BoxStream<'a, Result<RemoteFile, FaxlineError>>;

/// A cloud storage provider the relay uploads to and sweeps.
///
/// Implementations obtain a valid access token before every request, so
/// callers never deal with credentials directly.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &str;

    /// Creates `folder` if it is missing. Succeeds when the folder already
    /// exists or another process creates it concurrently.
    async fn ensure_folder(&self, folder: &str) -> Result<(), FaxlineError>;

    /// Uploads the file at `local_path` into `folder`, overwriting a file of
    /// the same name.
    async fn upload(&self, local_path: &Path, folder: &str) -> Result<RemoteFile, FaxlineError>;

    /// Creates an anonymous, non-expiring view link for `file`.
    async fn create_share_link(&self, file: &RemoteFile) -> Result<String, FaxlineError>;

    /// Lists the files in `folder`, fetching pages on demand.
    ///
    /// The stream is finite and not restartable; every call pages from the
    /// beginning.
    fn list_files<'a>(&'a self, folder: &'a str) -> RemoteFileStream<'a>;

    /// Removes every sharing link on `file`. Must run before [`delete_file`].
    ///
    /// [`delete_file`]: StorageBackend::delete_file
    async fn revoke_links(&self, file: &RemoteFile) -> Result<(), FaxlineError>;

    /// Deletes `file`. Deleting a file that is already gone succeeds.
    async fn delete_file(&self, file: &RemoteFile) -> Result<(), FaxlineError>;

    /// Silently refreshes and persists the credential.
    async fn refresh_credentials(&self) -> Result<Credentials, FaxlineError>;
}
