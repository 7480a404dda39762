//! Azure Blob REST client
//!
//! Implements [`BlobStore`] over the blob service REST surface: bearer
//! tokens from the configured [`TokenProvider`], `x-ms-*` request headers,
//! atomic temp-file downloads with bounded retry, BlockBlob uploads and
//! paginated container listings.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::{Method, RequestBuilder, StatusCode};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use url::Url;

use super::{BlobProperties, BlobStore, ClientConfig};
use crate::auth::{AccessToken, TokenProvider};
use crate::constants::{identity, limits, storage};
use crate::errors::{StorageError, StorageResult};

/// Blob service client authenticating through a managed identity
pub struct AzureBlobClient {
    http: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
    api_version: String,
}

impl AzureBlobClient {
    /// Create a client from the shared configuration.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, tokens: Arc<dyn TokenProvider>) -> StorageResult<Self> {
        let http = config.build_http_client()?;
        Ok(Self {
            http,
            tokens,
            api_version: config.storage_api_version.clone(),
        })
    }

    async fn bearer(&self, identity: Option<&str>) -> StorageResult<AccessToken> {
        Ok(self
            .tokens
            .token(identity, identity::STORAGE_RESOURCE)
            .await?)
    }

    fn request(&self, method: Method, url: Url, token: &AccessToken) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(token.secret())
            .header(storage::VERSION_HEADER, &self.api_version)
            .header(storage::DATE_HEADER, http_date(Utc::now()))
    }

    async fn download_attempt(
        &self,
        blob: &Url,
        temp_path: &Path,
        token: &AccessToken,
    ) -> StorageResult<()> {
        let response = self
            .request(Method::GET, blob.clone(), token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(service_error("download", response).await);
        }
        let bytes = response.bytes().await?;
        let mut file = File::create(temp_path).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl BlobStore for AzureBlobClient {
    async fn download(
        &self,
        blob: &Url,
        destination: &Path,
        identity: Option<&str>,
    ) -> StorageResult<()> {
        let token = self.bearer(identity).await?;

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let temp_path = temp_download_path(destination);

        let mut retries = 0;
        loop {
            match self.download_attempt(blob, &temp_path, &token).await {
                Ok(()) => {
                    tokio::fs::rename(&temp_path, destination).await?;
                    debug!("downloaded {}", destination.display());
                    return Ok(());
                }
                Err(error) if retries < limits::MAX_RETRIES && is_transient(&error) => {
                    retries += 1;
                    let delay =
                        Duration::from_millis(limits::RETRY_BASE_DELAY_MS * 2_u64.pow(retries));
                    warn!(
                        "download failed (attempt {}/{}): {}, retrying in {}ms",
                        retries,
                        limits::MAX_RETRIES,
                        error,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => {
                    if temp_path.exists() {
                        let _ = tokio::fs::remove_file(&temp_path).await;
                    }
                    return Err(error);
                }
            }
        }
    }

    async fn upload(&self, source: &Path, blob: &Url, identity: Option<&str>) -> StorageResult<()> {
        if !source.exists() {
            return Err(StorageError::FileNotFound {
                path: source.to_path_buf(),
            });
        }
        let token = self.bearer(identity).await?;
        let bytes = tokio::fs::read(source).await?;
        let response = self
            .request(Method::PUT, blob.clone(), &token)
            .header(storage::BLOB_TYPE_HEADER, storage::BLOCK_BLOB)
            .body(bytes)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(service_error("upload", response).await);
        }
        debug!("uploaded {} to {}", source.display(), blob);
        Ok(())
    }

    async fn list(
        &self,
        container: &Url,
        prefix: Option<&str>,
        identity: Option<&str>,
    ) -> StorageResult<Vec<String>> {
        let token = self.bearer(identity).await?;
        let mut names = Vec::new();
        let mut marker: Option<String> = None;

        // The service caps each page; follow NextMarker until exhausted.
        loop {
            let mut url = container.clone();
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("restype", "container");
                query.append_pair("comp", "list");
                if let Some(prefix) = prefix {
                    query.append_pair("prefix", prefix);
                }
                if let Some(marker) = &marker {
                    query.append_pair("marker", marker);
                }
            }
            let response = self.request(Method::GET, url, &token).send().await?;
            if !response.status().is_success() {
                return Err(service_error("list", response).await);
            }
            let body = response.text().await?;
            names.extend(extract_names(&body));
            marker = extract_marker(&body);
            if marker.is_none() {
                break;
            }
        }
        debug!("listed {} blobs under {}", names.len(), container);
        Ok(names)
    }

    async fn ensure_container(&self, container: &Url, identity: Option<&str>) -> StorageResult<()> {
        let token = self.bearer(identity).await?;
        let mut url = container.clone();
        url.query_pairs_mut().append_pair("restype", "container");
        let response = self.request(Method::PUT, url, &token).send().await?;
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT => {
                debug!("container {} already exists", container);
                Ok(())
            }
            _ => Err(service_error("create container", response).await),
        }
    }

    async fn properties(
        &self,
        blob: &Url,
        identity: Option<&str>,
    ) -> StorageResult<Option<BlobProperties>> {
        let token = self.bearer(identity).await?;
        let response = self
            .request(Method::HEAD, blob.clone(), &token)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(service_error("properties", response).await);
        }
        let last_modified = response
            .headers()
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_http_date);
        let content_length = response.content_length();
        Ok(Some(BlobProperties {
            last_modified,
            content_length,
        }))
    }

    async fn delete(&self, blob: &Url, identity: Option<&str>) -> StorageResult<()> {
        let token = self.bearer(identity).await?;
        let response = self
            .request(Method::DELETE, blob.clone(), &token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(service_error("delete", response).await);
        }
        debug!("deleted {}", blob);
        Ok(())
    }
}

/// Drain a failed response into a typed service error.
async fn service_error(operation: &'static str, response: reqwest::Response) -> StorageError {
    let status = response.status().as_u16();
    let detail = response.text().await.unwrap_or_default();
    debug!(operation, status, %detail, "blob service request failed");
    StorageError::Service {
        operation,
        status,
        detail,
    }
}

/// Transient failures worth retrying: transport errors, throttling and
/// server-side 5xx answers.
fn is_transient(error: &StorageError) -> bool {
    match error {
        StorageError::Http(_) => true,
        StorageError::Service { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}

/// Temp-file sibling used for atomic downloads.
fn temp_download_path(destination: &Path) -> std::path::PathBuf {
    destination.with_extension(format!(
        "{}{}",
        destination
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or(""),
        storage::TEMP_FILE_SUFFIX
    ))
}

/// RFC 1123 timestamp for the `x-ms-date` header.
fn http_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn parse_http_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// Blob names from a listing page, in wire order.
fn extract_names(body: &str) -> Vec<String> {
    let pattern = Regex::new(r"<Name>([^<]*)</Name>").expect("listing pattern is valid");
    pattern
        .captures_iter(body)
        .map(|capture| unescape_xml(&capture[1]))
        .collect()
}

/// Continuation marker from a listing page, when another page follows.
fn extract_marker(body: &str) -> Option<String> {
    let pattern = Regex::new(r"<NextMarker>([^<]+)</NextMarker>").expect("marker pattern is valid");
    let marker = pattern
        .captures_iter(body)
        .map(|capture| unescape_xml(&capture[1]))
        .find(|marker| !marker.is_empty());
    marker
}

fn unescape_xml(raw: &str) -> String {
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
