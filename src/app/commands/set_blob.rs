//! `setblob` — upload a local file as a blob
//!
//! Two execution modes share the contract: an explicit blob URL, or a
//! container URL with the blob name derived from the file path. The local
//! file must exist before any network call is made.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clap::ArgMatches;
use tracing::debug;
use url::Url;

use super::schema::{self, ArgKind, ArgSpec, CommandSpec};
use super::Command;
use crate::app::storage::{parse_url, BlobStore};
use crate::errors::{AppError, Result, StorageError};

pub struct SetBlob {
    store: Arc<dyn BlobStore>,
}

#[derive(Debug, Clone)]
pub struct SetBlobOptions {
    pub file: PathBuf,
    pub container: Option<String>,
    pub blob: Option<Url>,
    pub identity: Option<String>,
}

impl SetBlobOptions {
    fn bind(matches: &ArgMatches) -> Result<Self> {
        let blob = match schema::string_value(matches, "blob") {
            Some(raw) => Some(parse_url(&raw)?),
            None => None,
        };
        Ok(Self {
            file: PathBuf::from(schema::required_value(matches, "file")?),
            container: schema::string_value(matches, "container"),
            blob,
            identity: schema::string_value(matches, schema::IDENTITY),
        })
    }
}

impl SetBlob {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, options: &SetBlobOptions) -> Result<Vec<String>> {
        if !options.file.exists() {
            return Err(StorageError::FileNotFound {
                path: options.file.clone(),
            }
            .into());
        }

        let identity = options.identity.as_deref();
        match (&options.container, &options.blob) {
            (Some(container), None) => {
                let trimmed = container.trim_end_matches('/');
                let container_url = parse_url(trimmed)?;
                self.store.ensure_container(&container_url, identity).await?;

                let name = options.file.to_string_lossy().replace('\\', "/");
                let blob = parse_url(&format!("{trimmed}/{}", name.trim_start_matches('/')))?;
                debug!(%blob, "uploading into container");
                self.store.upload(&options.file, &blob, identity).await?;
            }
            (None, Some(blob)) => {
                debug!(%blob, "uploading to blob URL");
                self.store.upload(&options.file, blob, identity).await?;
            }
            _ => {
                return Err(AppError::generic(
                    "specify exactly one of --container or --blob",
                ))
            }
        }
        Ok(vec!["Success".to_string()])
    }
}

#[async_trait]
impl Command for SetBlob {
    fn spec(&self) -> CommandSpec {
        CommandSpec::new(
            "setblob",
            "Uploads a local file as a blob.",
            vec![
                ArgSpec::required(
                    "file",
                    Some('f'),
                    "Path of the local file to upload. Example: ./report.csv",
                    ArgKind::Str,
                ),
                ArgSpec::optional(
                    "container",
                    None,
                    "URL of the container the file is uploaded into; the blob name is derived from the file path. Cannot be combined with --blob.",
                    ArgKind::Url,
                ),
                ArgSpec::optional(
                    "blob",
                    None,
                    "Full URL of the destination blob. Cannot be combined with --container.",
                    ArgKind::Url,
                ),
                schema::identity_arg(),
                schema::verbose_arg(),
            ],
        )
    }

    async fn run(&self, matches: &ArgMatches) -> Result<Vec<String>> {
        let options = SetBlobOptions::bind(matches)?;
        self.execute(&options).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::app::storage::testing::MemoryBlobStore;
    use crate::errors::ErrorCategory;

    fn options(file: PathBuf) -> SetBlobOptions {
        SetBlobOptions {
            file,
            container: None,
            blob: None,
            identity: Some("my-identity".to_string()),
        }
    }

    #[tokio::test]
    async fn missing_file_fails_before_any_store_call() {
        let store = Arc::new(MemoryBlobStore::new());
        let command = SetBlob::new(store.clone());

        let error = command
            .execute(&SetBlobOptions {
                blob: Some(Url::parse("https://acc.example/data/absent.txt").unwrap()),
                ..options(PathBuf::from("/definitely/absent.txt"))
            })
            .await
            .unwrap_err();

        assert_eq!(error.category(), ErrorCategory::LocalPrecondition);
        assert_eq!(store.uploads.load(Ordering::SeqCst), 0);
        assert_eq!(store.ensured.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn uploads_to_an_explicit_blob_url() {
        let store = Arc::new(MemoryBlobStore::new());
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("report.csv");
        std::fs::write(&file, b"rows").unwrap();

        let lines = SetBlob::new(store.clone())
            .execute(&SetBlobOptions {
                blob: Some(Url::parse("https://acc.example/data/report.csv").unwrap()),
                ..options(file)
            })
            .await
            .unwrap();

        assert_eq!(lines, vec!["Success"]);
        assert!(store.contains("https://acc.example/data/report.csv"));
    }

    #[tokio::test]
    async fn container_mode_creates_the_container_and_derives_the_name() {
        let store = Arc::new(MemoryBlobStore::new());
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("report.csv");
        std::fs::write(&file, b"rows").unwrap();

        let lines = SetBlob::new(store.clone())
            .execute(&SetBlobOptions {
                container: Some("https://acc.example/data/".to_string()),
                ..options(file.clone())
            })
            .await
            .unwrap();

        assert_eq!(lines, vec!["Success"]);
        assert_eq!(store.ensured.load(Ordering::SeqCst), 1);
        assert_eq!(store.uploads.load(Ordering::SeqCst), 1);
        // The blob name is the file path with the leading separator trimmed.
        let expected = format!(
            "https://acc.example/data/{}",
            file.to_string_lossy().trim_start_matches('/')
        );
        assert!(store.contains(&expected));
    }

    #[tokio::test]
    async fn choosing_both_modes_is_rejected() {
        let store = Arc::new(MemoryBlobStore::new());
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("report.csv");
        std::fs::write(&file, b"rows").unwrap();

        let error = SetBlob::new(store.clone())
            .execute(&SetBlobOptions {
                container: Some("https://acc.example/data".to_string()),
                blob: Some(Url::parse("https://acc.example/data/report.csv").unwrap()),
                ..options(file)
            })
            .await
            .unwrap_err();

        assert_eq!(error.category(), ErrorCategory::InvalidInput);
        assert_eq!(store.uploads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn choosing_neither_mode_is_rejected() {
        let store = Arc::new(MemoryBlobStore::new());
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("report.csv");
        std::fs::write(&file, b"rows").unwrap();

        let error = SetBlob::new(store).execute(&options(file)).await.unwrap_err();
        assert_eq!(error.category(), ErrorCategory::InvalidInput);
    }
}
