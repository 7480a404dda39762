//! `listblobs` — enumerate blob names in a container
//!
//! The listing helper is shared with the batch download: server-side prefix
//! filtering, client-side exclusion regex, and an explicit empty marker so
//! callers can tell "no blobs exist" apart from an empty post-filter set.

use std::sync::Arc;

use async_trait::async_trait;
use clap::ArgMatches;
use regex::Regex;
use tracing::debug;

use super::schema::{self, ArgKind, ArgSpec, CommandSpec};
use super::Command;
use crate::app::storage::{parse_url, BlobStore};
use crate::errors::Result;

pub struct ListBlobs {
    store: Arc<dyn BlobStore>,
}

#[derive(Debug, Clone)]
pub struct ListBlobsOptions {
    pub container: String,
    pub identity: Option<String>,
    pub prefix: Option<String>,
    pub exclude: Option<String>,
}

impl ListBlobsOptions {
    fn bind(matches: &ArgMatches) -> Result<Self> {
        Ok(Self {
            container: schema::required_value(matches, "container")?,
            identity: schema::string_value(matches, schema::IDENTITY),
            prefix: schema::string_value(matches, "prefix"),
            exclude: schema::string_value(matches, "exclude"),
        })
    }
}

/// Collect blob names for a container, creating it when absent.
///
/// Returns `None` when the container holds no blobs at all; otherwise the
/// surviving names after the exclusion filter, in store-native order.
pub(crate) async fn collect_names(
    store: &dyn BlobStore,
    container: &str,
    identity: Option<&str>,
    prefix: Option<&str>,
    exclude: Option<&str>,
) -> Result<Option<Vec<String>>> {
    let container_url = parse_url(container.trim_end_matches('/'))?;
    store.ensure_container(&container_url, identity).await?;

    let names = store.list(&container_url, prefix, identity).await?;
    if names.is_empty() {
        return Ok(None);
    }

    let names = match exclude {
        Some(pattern) => {
            let pattern = Regex::new(pattern)?;
            names
                .into_iter()
                .filter(|name| !pattern.is_match(name))
                .collect()
        }
        None => names,
    };
    Ok(Some(names))
}

impl ListBlobs {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, options: &ListBlobsOptions) -> Result<Vec<String>> {
        let names = collect_names(
            self.store.as_ref(),
            &options.container,
            options.identity.as_deref(),
            options.prefix.as_deref(),
            options.exclude.as_deref(),
        )
        .await?;
        match names {
            Some(names) => Ok(names),
            None => {
                debug!(container = %options.container, "container holds no blobs");
                Ok(Vec::new())
            }
        }
    }
}

#[async_trait]
impl Command for ListBlobs {
    fn spec(&self) -> CommandSpec {
        CommandSpec::new(
            "listblobs",
            "Lists blob names in a container.",
            vec![
                ArgSpec::required(
                    "container",
                    Some('c'),
                    "URL of the container to enumerate. Example: https://myaccount.blob.core.windows.net/mycontainer",
                    ArgKind::Url,
                ),
                ArgSpec::optional(
                    "prefix",
                    None,
                    "Only blobs whose name begins with this prefix are returned.",
                    ArgKind::Str,
                ),
                ArgSpec::optional(
                    "exclude",
                    None,
                    "Exclude blobs that match the given regular expression.",
                    ArgKind::Str,
                ),
                schema::identity_arg(),
                schema::verbose_arg(),
            ],
        )
    }

    async fn run(&self, matches: &ArgMatches) -> Result<Vec<String>> {
        let options = ListBlobsOptions::bind(matches)?;
        self.execute(&options).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::app::storage::testing::MemoryBlobStore;
    use crate::errors::ErrorCategory;

    const CONTAINER: &str = "https://acc.example/data";

    fn seeded() -> Arc<MemoryBlobStore> {
        let store = Arc::new(MemoryBlobStore::new());
        store.put("https://acc.example/data/a.txt", b"a");
        store.put("https://acc.example/data/b.log", b"b");
        store.put("https://acc.example/data/c.txt", b"c");
        store
    }

    #[tokio::test]
    async fn empty_container_returns_the_empty_marker() {
        let store = Arc::new(MemoryBlobStore::new());
        let names = collect_names(store.as_ref(), CONTAINER, None, None, None)
            .await
            .unwrap();
        assert!(names.is_none());
    }

    #[tokio::test]
    async fn listing_ensures_the_container_exists() {
        let store = seeded();
        collect_names(store.as_ref(), CONTAINER, None, None, None)
            .await
            .unwrap();
        assert_eq!(store.ensured.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exclusion_filters_client_side() {
        let store = seeded();
        let names = collect_names(store.as_ref(), CONTAINER, None, None, Some(r"\.log$"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(names, vec!["a.txt", "c.txt"]);
    }

    #[tokio::test]
    async fn trailing_slashes_are_trimmed() {
        let store = seeded();
        let names = collect_names(
            store.as_ref(),
            "https://acc.example/data///",
            None,
            None,
            None,
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(names.len(), 3);
    }

    #[tokio::test]
    async fn command_prints_one_name_per_line() {
        let store = seeded();
        let lines = ListBlobs::new(store)
            .execute(&ListBlobsOptions {
                container: CONTAINER.to_string(),
                identity: Some("my-identity".to_string()),
                prefix: None,
                exclude: None,
            })
            .await
            .unwrap();
        assert_eq!(lines, vec!["a.txt", "b.log", "c.txt"]);
    }

    #[tokio::test]
    async fn command_prints_nothing_for_an_empty_container() {
        let store = Arc::new(MemoryBlobStore::new());
        let lines = ListBlobs::new(store)
            .execute(&ListBlobsOptions {
                container: CONTAINER.to_string(),
                identity: Some("my-identity".to_string()),
                prefix: None,
                exclude: None,
            })
            .await
            .unwrap();
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn invalid_exclusion_pattern_is_an_input_error() {
        let store = seeded();
        let error = collect_names(store.as_ref(), CONTAINER, None, None, Some("("))
            .await
            .unwrap_err();
        assert_eq!(error.category(), ErrorCategory::InvalidInput);
    }
}
