//! Blob store access
//!
//! The [`BlobStore`] trait is the seam between commands and the object
//! store: production code uses the REST implementation
//! ([`AzureBlobClient`]), tests substitute an in-memory store.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use url::Url;

use crate::errors::{StorageError, StorageResult};

pub mod client;
pub mod config;

pub use client::AzureBlobClient;
pub use config::ClientConfig;

/// Metadata for a single blob
#[derive(Debug, Clone, Default)]
pub struct BlobProperties {
    pub last_modified: Option<DateTime<Utc>>,
    pub content_length: Option<u64>,
}

/// Object store operations used by the commands.
///
/// Every operation authenticates as the given managed identity; listing
/// order is whatever the store returns.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Download a blob to a local file, creating parent directories.
    async fn download(
        &self,
        blob: &Url,
        destination: &Path,
        identity: Option<&str>,
    ) -> StorageResult<()>;

    /// Upload a local file to the given blob URL.
    async fn upload(&self, source: &Path, blob: &Url, identity: Option<&str>) -> StorageResult<()>;

    /// Enumerate blob names in a container, optionally server-side filtered
    /// by a name prefix.
    async fn list(
        &self,
        container: &Url,
        prefix: Option<&str>,
        identity: Option<&str>,
    ) -> StorageResult<Vec<String>>;

    /// Create the container when it does not exist yet.
    async fn ensure_container(&self, container: &Url, identity: Option<&str>) -> StorageResult<()>;

    /// Fetch blob metadata; `None` when the blob does not exist.
    async fn properties(
        &self,
        blob: &Url,
        identity: Option<&str>,
    ) -> StorageResult<Option<BlobProperties>>;

    /// Delete a blob.
    async fn delete(&self, blob: &Url, identity: Option<&str>) -> StorageResult<()>;
}

/// Parse a user-supplied URL into a typed one.
pub(crate) fn parse_url(raw: &str) -> StorageResult<Url> {
    Url::parse(raw).map_err(|source| StorageError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    struct StoredBlob {
        url: String,
        bytes: Vec<u8>,
        last_modified: Option<DateTime<Utc>>,
    }

    /// In-memory blob store with failure injection and call counters.
    ///
    /// Blobs are kept in insertion order, which doubles as the listing
    /// order.
    pub(crate) struct MemoryBlobStore {
        objects: Mutex<Vec<StoredBlob>>,
        failing: Mutex<HashSet<String>>,
        pub downloads: AtomicUsize,
        pub uploads: AtomicUsize,
        pub deletes: AtomicUsize,
        pub ensured: AtomicUsize,
        pub head_requests: AtomicUsize,
    }

    impl MemoryBlobStore {
        pub fn new() -> Self {
            Self {
                objects: Mutex::new(Vec::new()),
                failing: Mutex::new(HashSet::new()),
                downloads: AtomicUsize::new(0),
                uploads: AtomicUsize::new(0),
                deletes: AtomicUsize::new(0),
                ensured: AtomicUsize::new(0),
                head_requests: AtomicUsize::new(0),
            }
        }

        pub fn put(&self, url: &str, bytes: &[u8]) {
            let mut objects = self.objects.lock().unwrap();
            objects.retain(|blob| blob.url != url);
            objects.push(StoredBlob {
                url: url.to_string(),
                bytes: bytes.to_vec(),
                last_modified: None,
            });
        }

        pub fn set_last_modified(&self, url: &str, timestamp: DateTime<Utc>) {
            let mut objects = self.objects.lock().unwrap();
            if let Some(blob) = objects.iter_mut().find(|blob| blob.url == url) {
                blob.last_modified = Some(timestamp);
            }
        }

        pub fn fail_download(&self, url: &str) {
            self.failing.lock().unwrap().insert(url.to_string());
        }

        pub fn contains(&self, url: &str) -> bool {
            self.objects
                .lock()
                .unwrap()
                .iter()
                .any(|blob| blob.url == url)
        }

        pub fn object_count(&self) -> usize {
            self.objects.lock().unwrap().len()
        }

        fn lookup(&self, url: &str) -> Option<Vec<u8>> {
            self.objects
                .lock()
                .unwrap()
                .iter()
                .find(|blob| blob.url == url)
                .map(|blob| blob.bytes.clone())
        }
    }

    #[async_trait]
    impl BlobStore for MemoryBlobStore {
        async fn download(
            &self,
            blob: &Url,
            destination: &Path,
            _identity: Option<&str>,
        ) -> StorageResult<()> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            if self.failing.lock().unwrap().contains(blob.as_str()) {
                return Err(StorageError::Service {
                    operation: "download",
                    status: 500,
                    detail: "injected failure".to_string(),
                });
            }
            let bytes = self.lookup(blob.as_str()).ok_or(StorageError::Service {
                operation: "download",
                status: 404,
                detail: String::new(),
            })?;
            if let Some(parent) = destination.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(destination, bytes)?;
            Ok(())
        }

        async fn upload(
            &self,
            source: &Path,
            blob: &Url,
            _identity: Option<&str>,
        ) -> StorageResult<()> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            let bytes = std::fs::read(source)?;
            self.put(blob.as_str(), &bytes);
            Ok(())
        }

        async fn list(
            &self,
            container: &Url,
            prefix: Option<&str>,
            _identity: Option<&str>,
        ) -> StorageResult<Vec<String>> {
            let base = format!("{}/", container.as_str().trim_end_matches('/'));
            Ok(self
                .objects
                .lock()
                .unwrap()
                .iter()
                .filter_map(|blob| blob.url.strip_prefix(&base).map(String::from))
                .filter(|name| prefix.map_or(true, |p| name.starts_with(p)))
                .collect())
        }

        async fn ensure_container(
            &self,
            _container: &Url,
            _identity: Option<&str>,
        ) -> StorageResult<()> {
            self.ensured.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn properties(
            &self,
            blob: &Url,
            _identity: Option<&str>,
        ) -> StorageResult<Option<BlobProperties>> {
            self.head_requests.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .objects
                .lock()
                .unwrap()
                .iter()
                .find(|stored| stored.url == blob.as_str())
                .map(|stored| BlobProperties {
                    last_modified: stored.last_modified,
                    content_length: Some(stored.bytes.len() as u64),
                }))
        }

        async fn delete(&self, blob: &Url, _identity: Option<&str>) -> StorageResult<()> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            let mut objects = self.objects.lock().unwrap();
            let before = objects.len();
            objects.retain(|stored| stored.url != blob.as_str());
            if objects.len() == before {
                return Err(StorageError::Service {
                    operation: "delete",
                    status: 404,
                    detail: String::new(),
                });
            }
            Ok(())
        }
    }
}
