// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dropbox backend over the v2 HTTP API.
//!
//! RPC endpoints take JSON bodies and report most failures as 409 with an
//! `error_summary` tag. Uploads go to the content host with their arguments
//! in the `Dropbox-API-Arg` header.

pub mod auth;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use faxline_core::{
    Credentials, FaxlineError, RemoteFile, RemoteFileStream, StorageBackend, file_name_of,
};
use futures::{StreamExt, TryStreamExt, stream};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::http::{ApiClient, read_json, status_error};
use crate::manager::CredentialManager;

pub use auth::DropboxAuthenticator;

const API_ARG_HEADER: &str = "Dropbox-API-Arg";

#[derive(Debug, Deserialize)]
struct FileMetadata {
    id: String,
    name: String,
    server_modified: DateTime<Utc>,
}

impl FileMetadata {
    fn into_remote(self, folder: &str) -> RemoteFile {
        RemoteFile {
            id: self.id,
            name: self.name,
            created_at: self.server_modified,
            parent_folder: folder.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = ".tag", rename_all = "lowercase")]
enum Metadata {
    File(FileMetadata),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ListFolderResult {
    entries: Vec<Metadata>,
    cursor: String,
    has_more: bool,
}

#[derive(Debug, Deserialize)]
struct SharedLink {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ListSharedLinksResult {
    links: Vec<SharedLink>,
}

/// A 409 response body from an RPC endpoint.
#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    error_summary: String,
    #[serde(default)]
    error: Value,
}

async fn conflict(response: Response) -> ApiError {
    response.json().await.unwrap_or_default()
}

enum Page {
    First,
    Next(String),
    Done,
}

/// Dropbox storage backend.
pub struct DropboxBackend {
    api: ApiClient,
    api_base: String,
    content_base: String,
}

impl DropboxBackend {
    pub fn new(
        http: reqwest::Client,
        credentials: Arc<CredentialManager>,
        api_base: impl Into<String>,
        content_base: impl Into<String>,
    ) -> Self {
        Self {
            api: ApiClient::new(http, credentials),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            content_base: content_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn rpc_url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.api_base)
    }

    async fn rpc(&self, endpoint: &str, body: &Value) -> Result<Response, FaxlineError> {
        let url = self.rpc_url(endpoint);
        self.api.send(|c| c.post(&url).json(body)).await
    }

    async fn list_page(&self, folder: &str, page: &Page) -> Result<ListFolderResult, FaxlineError> {
        let response = match page {
            Page::First => {
                self.rpc(
                    "files/list_folder",
                    &json!({"path": dropbox_path(folder), "recursive": false}),
                )
                .await?
            }
            Page::Next(cursor) => {
                self.rpc("files/list_folder/continue", &json!({"cursor": cursor}))
                    .await?
            }
            Page::Done => {
                return Err(FaxlineError::Internal("listing already finished".into()));
            }
        };
        if !response.status().is_success() {
            return Err(status_error(response, "folder listing failed").await);
        }
        read_json(response, "folder listing").await
    }

    async fn existing_link(&self, file: &RemoteFile) -> Result<Option<String>, FaxlineError> {
        let response = self
            .rpc(
                "sharing/list_shared_links",
                &json!({"path": file.id, "direct_only": true}),
            )
            .await?;
        if !response.status().is_success() {
            return Err(FaxlineError::Sharing {
                message: format!("list_shared_links returned {}", response.status()),
            });
        }
        let result: ListSharedLinksResult =
            response.json().await.map_err(|e| FaxlineError::Sharing {
                message: format!("malformed list_shared_links response: {e}"),
            })?;
        Ok(result.links.into_iter().next().map(|l| l.url))
    }
}

#[async_trait]
impl StorageBackend for DropboxBackend {
    fn name(&self) -> &str {
        "dropbox"
    }

    async fn ensure_folder(&self, folder: &str) -> Result<(), FaxlineError> {
        let response = self
            .rpc(
                "files/create_folder_v2",
                &json!({"path": dropbox_path(folder), "autorename": false}),
            )
            .await?;
        match response.status() {
            s if s.is_success() => {
                info!(folder, "created remote folder");
                Ok(())
            }
            StatusCode::CONFLICT => {
                let err = conflict(response).await;
                if err.error_summary.starts_with("path/conflict") {
                    Ok(())
                } else {
                    Err(FaxlineError::transfer_status(
                        409,
                        format!("folder creation failed: {}", err.error_summary),
                    ))
                }
            }
            _ => Err(status_error(response, "folder creation failed").await),
        }
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
        let arg = header_safe_json(&json!({
            "path": format!("{}/{name}", dropbox_path(folder)),
            "mode": "overwrite",
            "autorename": false,
            "mute": true,
        }));
        let url = format!("{}/files/upload", self.content_base);

        let response = self
            .api
            .send(|c| {
                c.post(&url)
                    .header(API_ARG_HEADER, arg.as_str())
                    .header(CONTENT_TYPE, "application/octet-stream")
                    .body(bytes.clone())
            })
            .await?;
        if !response.status().is_success() {
            return Err(status_error(response, "upload failed").await);
        }
        let meta: FileMetadata = read_json(response, "upload").await?;
        debug!(id = %meta.id, name = %meta.name, "uploaded to dropbox");
        Ok(meta.into_remote(folder))
    }

    async fn create_share_link(&self, file: &RemoteFile) -> Result<String, FaxlineError> {
        let response = self
            .rpc(
                "sharing/create_shared_link_with_settings",
                &json!({
                    "path": file.id,
                    "settings": {"requested_visibility": "public"},
                }),
            )
            .await?;

        let url = match response.status() {
            s if s.is_success() => {
                let link: SharedLink = response.json().await.map_err(|e| FaxlineError::Sharing {
                    message: format!("malformed shared link response: {e}"),
                })?;
                Some(link.url)
            }
            StatusCode::CONFLICT => {
                let err = conflict(response).await;
                if !err.error_summary.starts_with("shared_link_already_exists") {
                    return Err(FaxlineError::Sharing {
                        message: format!("shared link refused: {}", err.error_summary),
                    });
                }
                let embedded = err
                    .error
                    .pointer("/shared_link_already_exists/metadata/url")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                match embedded {
                    Some(url) => Some(url),
                    None => self.existing_link(file).await?,
                }
            }
            status => {
                return Err(FaxlineError::Sharing {
                    message: format!("create_shared_link_with_settings returned {status}"),
                });
            }
        };

        url.map(|u| direct_download(&u))
            .ok_or_else(|| FaxlineError::Sharing {
                message: format!("no shared link returned for {}", file.name),
            })
    }

    fn list_files<'a>(&'a self, folder: &'a str) -> RemoteFileStream<'a> {
        stream::try_unfold(Page::First, move |page| async move {
            if matches!(page, Page::Done) {
                return Ok::<_, FaxlineError>(None);
            }
            let result = self.list_page(folder, &page).await?;
            let next = if result.has_more {
                Page::Next(result.cursor)
            } else {
                Page::Done
            };
            let files: Vec<RemoteFile> = result
                .entries
                .into_iter()
                .filter_map(|entry| match entry {
                    Metadata::File(meta) => Some(meta.into_remote(folder)),
                    Metadata::Other => None,
                })
                .collect();
            Ok(Some((files, next)))
        })
        .map_ok(|files| stream::iter(files.into_iter().map(Ok::<RemoteFile, FaxlineError>)))
        .try_flatten()
        .boxed()
    }

    async fn revoke_links(&self, file: &RemoteFile) -> Result<(), FaxlineError> {
        let response = self
            .rpc(
                "sharing/list_shared_links",
                &json!({"path": file.id, "direct_only": true}),
            )
            .await?;
        match response.status() {
            s if s.is_success() => {}
            StatusCode::CONFLICT => {
                let err = conflict(response).await;
                if err.error_summary.contains("not_found") {
                    return Ok(());
                }
                return Err(FaxlineError::transfer_status(
                    409,
                    format!("shared link listing failed: {}", err.error_summary),
                ));
            }
            _ => return Err(status_error(response, "shared link listing failed").await),
        }
        let links: ListSharedLinksResult = read_json(response, "shared link listing").await?;

        for link in links.links {
            let response = self
                .rpc("sharing/revoke_shared_link", &json!({"url": link.url}))
                .await?;
            match response.status() {
                s if s.is_success() => debug!(file = %file.name, "revoked shared link"),
                StatusCode::CONFLICT => {
                    let err = conflict(response).await;
                    if !err.error_summary.starts_with("shared_link_not_found") {
                        return Err(FaxlineError::transfer_status(
                            409,
                            format!("link revocation failed: {}", err.error_summary),
                        ));
                    }
                }
                _ => return Err(status_error(response, "link revocation failed").await),
            }
        }
        Ok(())
    }

    async fn delete_file(&self, file: &RemoteFile) -> Result<(), FaxlineError> {
        let response = self
            .rpc("files/delete_v2", &json!({"path": file.id}))
            .await?;
        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::CONFLICT => {
                let err = conflict(response).await;
                if err.error_summary.starts_with("path_lookup/not_found") {
                    Ok(())
                } else {
                    Err(FaxlineError::transfer_status(
                        409,
                        format!("delete failed: {}", err.error_summary),
                    ))
                }
            }
            _ => Err(status_error(response, "delete failed").await),
        }
    }

    async fn refresh_credentials(&self) -> Result<Credentials, FaxlineError> {
        self.api.credentials().force_refresh().await
    }
}

/// `/folder` form Dropbox expects; the root is the empty string.
fn dropbox_path(folder: &str) -> String {
    let trimmed = folder.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Rewrites a preview link (`dl=0`) into a direct-download link (`dl=1`).
pub fn direct_download(url: &str) -> String {
    if url.contains("dl=0") {
        return url.replacen("dl=0", "dl=1", 1);
    }
    if url.contains("dl=1") {
        return url.to_string();
    }
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}dl=1")
}

/// JSON for an HTTP header: non-ASCII characters escaped as `\uXXXX`.
fn header_safe_json(value: &Value) -> String {
    let raw = value.to_string();
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    out
}
