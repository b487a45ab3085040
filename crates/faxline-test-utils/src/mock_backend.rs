// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory storage backend for deterministic pipeline and sweeper tests.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use faxline_cloud::CredentialManager;
use faxline_core::{
    Credentials, FaxlineError, RemoteFile, RemoteFileStream, StorageBackend, file_name_of,
};
use futures::{StreamExt, stream};
use tokio::sync::Mutex;

/// A storage backend that records every call.
///
/// Uploads whose file name is registered with [`fail_uploads_of`] fail with
/// a 503 transfer error; deletes registered with [`fail_deletes_of`] fail
/// the same way. Listings return whatever [`set_remote_files`] installed.
///
/// With [`with_credentials`], uploads and deletes first ask the credential
/// manager for a valid token, as the HTTP backends do on every request.
///
/// [`with_credentials`]: MockBackend::with_credentials
/// [`fail_uploads_of`]: MockBackend::fail_uploads_of
/// [`fail_deletes_of`]: MockBackend::fail_deletes_of
/// [`set_remote_files`]: MockBackend::set_remote_files
pub struct MockBackend {
    folders: Arc<Mutex<Vec<String>>>,
    uploads: Arc<Mutex<Vec<String>>>,
    revoked: Arc<Mutex<Vec<String>>>,
    deleted: Arc<Mutex<Vec<String>>>,
    remote_files: Arc<Mutex<Vec<RemoteFile>>>,
    failing_uploads: Arc<Mutex<HashSet<String>>>,
    failing_deletes: Arc<Mutex<HashSet<String>>>,
    credentials: Option<Arc<CredentialManager>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            folders: Arc::default(),
            uploads: Arc::default(),
            revoked: Arc::default(),
            deleted: Arc::default(),
            remote_files: Arc::default(),
            failing_uploads: Arc::default(),
            failing_deletes: Arc::default(),
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, credentials: Arc<CredentialManager>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    async fn authorize(&self) -> Result<(), FaxlineError> {
        if let Some(credentials) = &self.credentials {
            credentials.get_valid().await?;
        }
        Ok(())
    }

    pub async fn fail_uploads_of(&self, file_name: &str) {
        self.failing_uploads.lock().await.insert(file_name.to_string());
    }

    pub async fn fail_deletes_of(&self, file_name: &str) {
        self.failing_deletes.lock().await.insert(file_name.to_string());
    }

    pub async fn set_remote_files(&self, files: Vec<RemoteFile>) {
        *self.remote_files.lock().await = files;
    }

    /// File names uploaded so far, in order.
    pub async fn uploaded(&self) -> Vec<String> {
        self.uploads.lock().await.clone()
    }

    pub async fn ensured_folders(&self) -> Vec<String> {
        self.folders.lock().await.clone()
    }

    pub async fn revoked(&self) -> Vec<String> {
        self.revoked.lock().await.clone()
    }

    pub async fn deleted(&self) -> Vec<String> {
        self.deleted.lock().await.clone()
    }

    /// The link [`StorageBackend::create_share_link`] returns for `file_name`.
    pub fn link_for(file_name: &str) -> String {
        format!("https://share.example.test/{file_name}")
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        "mock-backend"
    }

    async fn ensure_folder(&self, folder: &str) -> Result<(), FaxlineError> {
        self.folders.lock().await.push(folder.to_string());
        Ok(())
    }

    async fn upload(&self, local_path: &Path, folder: &str) -> Result<RemoteFile, FaxlineError> {
        self.authorize().await?;
        let name = file_name_of(local_path)
            .ok_or_else(|| FaxlineError::Internal("upload path has no file name".into()))?
            .to_string();
        if self.failing_uploads.lock().await.contains(&name) {
            return Err(FaxlineError::transfer_status(503, format!("upload of {name} failed")));
        }
        if !tokio::fs::try_exists(local_path).await.unwrap_or(false) {
            return Err(FaxlineError::Transfer {
                message: format!("{} does not exist", local_path.display()),
                status: None,
                source: None,
            });
        }

        self.uploads.lock().await.push(name.clone());
        Ok(RemoteFile {
            id: format!("mock-{name}"),
            name,
            created_at: Utc::now(),
            parent_folder: folder.to_string(),
        })
    }

    async fn create_share_link(&self, file: &RemoteFile) -> Result<String, FaxlineError> {
        Ok(Self::link_for(&file.name))
    }

    fn list_files<'a>(&'a self, _folder: &'a str) -> RemoteFileStream<'a> {
        stream::once(async move { self.remote_files.lock().await.clone() })
            .flat_map(|files| stream::iter(files.into_iter().map(Ok::<_, FaxlineError>)))
            .boxed()
    }

    async fn revoke_links(&self, file: &RemoteFile) -> Result<(), FaxlineError> {
        self.revoked.lock().await.push(file.name.clone());
        Ok(())
    }

    async fn delete_file(&self, file: &RemoteFile) -> Result<(), FaxlineError> {
        self.authorize().await?;
        if self.failing_deletes.lock().await.contains(&file.name) {
            return Err(FaxlineError::transfer_status(500, format!("delete of {} failed", file.name)));
        }
        self.deleted.lock().await.push(file.name.clone());
        self.remote_files.lock().await.retain(|f| f.id != file.id);
        Ok(())
    }

    async fn refresh_credentials(&self) -> Result<Credentials, FaxlineError> {
        Ok(Credentials::from_expires_in(
            "mock-token".into(),
            3600,
            None,
            Utc::now(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn failing_upload_is_transfer_error() {
        let backend = MockBackend::new();
        backend.fail_uploads_of("a.pdf").await;
        let err = backend
            .upload(Path::new("/nowhere/a.pdf"), "FAX")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert!(backend.uploaded().await.is_empty());
    }

    #[tokio::test]
    async fn listing_reflects_deletes() {
        let backend = MockBackend::new();
        let file = RemoteFile {
            id: "1".into(),
            name: "a.pdf".into(),
            created_at: Utc::now(),
            parent_folder: "FAX".into(),
        };
        backend.set_remote_files(vec![file.clone()]).await;
        backend.delete_file(&file).await.unwrap();

        let listed: Vec<RemoteFile> = backend.list_files("FAX").try_collect().await.unwrap();
        assert!(listed.is_empty());
        assert_eq!(backend.deleted().await, vec!["a.pdf".to_string()]);
    }
}
