// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OneDrive backend over Microsoft Graph v1.0.
//!
//! Files are addressed by path (`/me/drive/root:/{folder}/{name}`) for upload
//! and listing, and by item id for sharing and deletion.

pub mod auth;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use faxline_core::{
    Credentials, FaxlineError, RemoteFile, RemoteFileStream, StorageBackend, file_name_of,
};
use futures::{StreamExt, TryStreamExt, stream};
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::{debug, info};

use crate::http::{ApiClient, encode_path, read_json, status_error};
use crate::manager::CredentialManager;

pub use auth::GraphAuthenticator;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveItem {
    id: String,
    name: String,
    created_date_time: DateTime<Utc>,
    #[serde(default)]
    file: Option<serde_json::Value>,
}

impl DriveItem {
    fn into_remote(self, folder: &str) -> RemoteFile {
        RemoteFile {
            id: self.id,
            name: self.name,
            created_at: self.created_date_time,
            parent_folder: folder.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChildrenPage {
    value: Vec<DriveItem>,
    #[serde(rename = "@odata.nextLink", default)]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateLinkResponse {
    #[serde(default)]
    link: Option<SharingLink>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SharingLink {
    #[serde(default)]
    web_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PermissionsPage {
    value: Vec<Permission>,
}

#[derive(Debug, Deserialize)]
struct Permission {
    id: String,
    #[serde(default)]
    link: Option<serde_json::Value>,
}

/// Microsoft Graph storage backend.
pub struct OneDriveBackend {
    api: ApiClient,
    base: String,
}

impl OneDriveBackend {
    pub fn new(
        http: reqwest::Client,
        credentials: Arc<CredentialManager>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            api: ApiClient::new(http, credentials),
            base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn root_path(&self, path: &str) -> String {
        format!("{}/me/drive/root:/{}", self.base, encode_path(path))
    }

    fn item(&self, id: &str) -> String {
        format!("{}/me/drive/items/{}", self.base, urlencoding::encode(id))
    }

    async fn folder_exists(&self, path: &str) -> Result<bool, FaxlineError> {
        let url = self.root_path(path);
        let response = self.api.send(|c| c.get(&url)).await?;
        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(status_error(response, "folder lookup failed").await),
        }
    }

    async fn create_folder(&self, parent: Option<&str>, name: &str) -> Result<(), FaxlineError> {
        let url = match parent {
            None => format!("{}/me/drive/root/children", self.base),
            Some(parent) => format!("{}:/children", self.root_path(parent)),
        };
        let body = serde_json::json!({
            "name": name,
            "folder": {},
            "@microsoft.graph.conflictBehavior": "fail",
        });
        let response = self.api.send(|c| c.post(&url).json(&body)).await?;
        match response.status() {
            s if s.is_success() => {
                info!(folder = name, "created remote folder");
                Ok(())
            }
            // Another writer created it between our lookup and create.
            StatusCode::CONFLICT => Ok(()),
            _ => Err(status_error(response, "folder creation failed").await),
        }
    }

    async fn children_page(&self, url: &str) -> Result<ChildrenPage, FaxlineError> {
        let response = self.api.send(|c| c.get(url)).await?;
        if !response.status().is_success() {
            return Err(status_error(response, "folder listing failed").await);
        }
        read_json(response, "folder listing").await
    }
}

#[async_trait]
impl StorageBackend for OneDriveBackend {
    fn name(&self) -> &str {
        "onedrive"
    }

    async fn ensure_folder(&self, folder: &str) -> Result<(), FaxlineError> {
        let segments: Vec<&str> = folder.split('/').filter(|s| !s.is_empty()).collect();
        for depth in 0..segments.len() {
            let path = segments[..=depth].join("/");
            if self.folder_exists(&path).await? {
                continue;
            }
            let parent = (depth > 0).then(|| segments[..depth].join("/"));
            self.create_folder(parent.as_deref(), segments[depth]).await?;
        }
        Ok(())
    }

    async fn upload(&self, local_path: &Path, folder: &str) -> Result<RemoteFile, FaxlineError> {
        let name = file_name_of(local_path).ok_or_else(|| FaxlineError::Transfer {
            message: format!("{} has no usable file name", local_path.display()),
            status: None,
            source: None,
        })?;
        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|e| FaxlineError::Transfer {
                message: format!("cannot read {}: {e}", local_path.display()),
                status: None,
                source: Some(Box::new(e)),
            })?;
        let mime = mime_guess::from_path(local_path)
            .first_or_octet_stream()
            .to_string();
        let url = format!("{}:/content", self.root_path(&format!("{folder}/{name}")));

        let response = self
            .api
            .send(|c| {
                c.put(&url)
                    .header(CONTENT_TYPE, mime.as_str())
                    .body(bytes.clone())
            })
            .await?;
        if !response.status().is_success() {
            return Err(status_error(response, "upload failed").await);
        }
        let item: DriveItem = read_json(response, "upload").await?;
        debug!(id = %item.id, name = %item.name, "uploaded to onedrive");
        Ok(item.into_remote(folder))
    }

    async fn create_share_link(&self, file: &RemoteFile) -> Result<String, FaxlineError> {
        let url = format!("{}/createLink", self.item(&file.id));
        let body = serde_json::json!({"type": "view", "scope": "anonymous"});
        let response = self.api.send(|c| c.post(&url).json(&body)).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FaxlineError::Sharing {
                message: format!("createLink returned {status}: {body}"),
            });
        }
        let created: CreateLinkResponse = response.json().await.map_err(|e| FaxlineError::Sharing {
            message: format!("malformed createLink response: {e}"),
        })?;
        created
            .link
            .and_then(|l| l.web_url)
            .ok_or_else(|| FaxlineError::Sharing {
                message: format!("createLink response for {} has no webUrl", file.name),
            })
    }

    fn list_files<'a>(&'a self, folder: &'a str) -> RemoteFileStream<'a> {
        let first = format!("{}:/children", self.root_path(folder));
        stream::try_unfold(Some(first), move |next| async move {
            let Some(url) = next else {
                return Ok::<_, FaxlineError>(None);
            };
            let page = self.children_page(&url).await?;
            let files: Vec<RemoteFile> = page
                .value
                .into_iter()
                .filter(|item| item.file.is_some())
                .map(|item| item.into_remote(folder))
                .collect();
            Ok(Some((files, page.next_link)))
        })
        .map_ok(|files| stream::iter(files.into_iter().map(Ok::<RemoteFile, FaxlineError>)))
        .try_flatten()
        .boxed()
    }

    async fn revoke_links(&self, file: &RemoteFile) -> Result<(), FaxlineError> {
        let url = format!("{}/permissions", self.item(&file.id));
        let response = self.api.send(|c| c.get(&url)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => return Ok(()),
            s if !s.is_success() => {
                return Err(status_error(response, "permission listing failed").await);
            }
            _ => {}
        }
        let page: PermissionsPage = read_json(response, "permission listing").await?;

        for permission in page.value.into_iter().filter(|p| p.link.is_some()) {
            let url = format!("{}/permissions/{}", self.item(&file.id), permission.id);
            let response = self.api.send(|c| c.delete(&url)).await?;
            let status = response.status();
            if !status.is_success() && status != StatusCode::NOT_FOUND {
                return Err(status_error(response, "link revocation failed").await);
            }
            debug!(file = %file.name, permission = %permission.id, "revoked sharing link");
        }
        Ok(())
    }

    async fn delete_file(&self, file: &RemoteFile) -> Result<(), FaxlineError> {
        let url = self.item(&file.id);
        let response = self.api.send(|c| c.delete(&url)).await?;
        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(status_error(response, "delete failed").await)
    }

    async fn refresh_credentials(&self) -> Result<Credentials, FaxlineError> {
        self.api.credentials().force_refresh().await
    }
}
