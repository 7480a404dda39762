//! `getblobs` — batch download of a container into a local directory
//!
//! Lists the container, maps every blob name onto a local path and runs the
//! transfers on a bounded concurrent stream. A single blob's failure is
//! recorded and never aborts the batch; the report keeps listing order and
//! ends with one summary line.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use clap::ArgMatches;
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use tracing::{debug, info, warn};
use url::Url;

use super::list_blobs::collect_names;
use super::schema::{self, ArgKind, ArgSpec, CommandSpec};
use super::Command;
use crate::app::storage::{parse_url, BlobStore};
use crate::constants::batch;
use crate::errors::Result;

/// Result of one blob transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    Success,
    /// The local copy is already up to date (only with `--if-newer`)
    Skipped,
    Failed,
}

impl TransferOutcome {
    fn label(self) -> &'static str {
        match self {
            TransferOutcome::Success => "Success",
            TransferOutcome::Skipped => "Skipped",
            TransferOutcome::Failed => "Failed",
        }
    }
}

/// Append-only per-item report with a trailing summary line
#[derive(Debug, Default)]
pub struct BatchReport {
    lines: Vec<String>,
    failures: usize,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: TransferOutcome, name: &str) {
        self.lines.push(format!("{} {name}", outcome.label()));
        if outcome == TransferOutcome::Failed {
            self.failures += 1;
        }
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Close the report: the summary line is always last.
    pub fn into_lines(mut self) -> Vec<String> {
        self.lines.push(if self.failures == 0 {
            "Success".to_string()
        } else {
            format!("Failed {} blobs", self.failures)
        });
        self.lines
    }
}

pub struct GetBlobs {
    store: Arc<dyn BlobStore>,
    cancel: Arc<AtomicBool>,
}

#[derive(Debug, Clone)]
pub struct GetBlobsOptions {
    pub container: String,
    pub directory: PathBuf,
    pub identity: Option<String>,
    pub prefix: Option<String>,
    pub exclude: Option<String>,
    pub if_newer: bool,
    pub delete_after_copy: bool,
}

impl GetBlobsOptions {
    fn bind(matches: &ArgMatches) -> Result<Self> {
        Ok(Self {
            container: schema::required_value(matches, "container")?,
            directory: PathBuf::from(schema::required_value(matches, "directory")?),
            identity: schema::string_value(matches, schema::IDENTITY),
            prefix: schema::string_value(matches, "prefix"),
            exclude: schema::string_value(matches, "exclude"),
            if_newer: schema::flag_value(matches, "if-newer"),
            delete_after_copy: schema::flag_value(matches, "delete-after-copy"),
        })
    }
}

impl GetBlobs {
    pub fn new(store: Arc<dyn BlobStore>, cancel: Arc<AtomicBool>) -> Self {
        Self { store, cancel }
    }

    pub async fn execute(&self, options: &GetBlobsOptions) -> Result<Vec<String>> {
        let container = options.container.trim_end_matches('/');

        let Some(names) = collect_names(
            self.store.as_ref(),
            container,
            options.identity.as_deref(),
            options.prefix.as_deref(),
            options.exclude.as_deref(),
        )
        .await?
        else {
            debug!(container, "container holds no blobs, nothing to transfer");
            return Ok(Vec::new());
        };

        info!(
            "transferring {} blobs with {} workers",
            names.len(),
            batch::DEFAULT_WORKER_COUNT
        );
        let progress = ProgressBar::new(names.len() as u64);

        // Unordered completion for throughput; outcomes carry the listing
        // index so the report can be restored to listing order.
        let mut outcomes: Vec<(usize, Option<TransferOutcome>)> =
            stream::iter(names.iter().cloned().enumerate())
                .map(|(index, name)| {
                    let progress = progress.clone();
                    async move {
                        if self.cancel.load(Ordering::SeqCst) {
                            return (index, None);
                        }
                        let outcome = self.transfer_one(container, &name, options).await;
                        progress.inc(1);
                        (index, Some(outcome))
                    }
                })
                .buffer_unordered(batch::DEFAULT_WORKER_COUNT)
                .collect()
                .await;
        progress.finish_and_clear();

        outcomes.sort_by_key(|(index, _)| *index);
        let mut report = BatchReport::new();
        for (index, outcome) in outcomes {
            if let Some(outcome) = outcome {
                report.record(outcome, &names[index]);
            }
        }
        if report.failures() > 0 {
            warn!("{} of {} transfers failed", report.failures(), names.len());
        }
        Ok(report.into_lines())
    }

    /// Transfer a single blob; every failure is contained into an outcome.
    async fn transfer_one(
        &self,
        container: &str,
        name: &str,
        options: &GetBlobsOptions,
    ) -> TransferOutcome {
        let identity = options.identity.as_deref();
        let blob = match parse_url(&format!("{container}/{name}")) {
            Ok(blob) => blob,
            Err(error) => {
                warn!(blob = name, %error, "blob name does not form a valid URL");
                return TransferOutcome::Failed;
            }
        };
        // Nested segments in the blob name recreate the directory layout.
        let destination = options.directory.join(name);

        if options.if_newer && self.up_to_date(&blob, &destination, identity).await {
            debug!(blob = name, "local copy is up to date");
            return TransferOutcome::Skipped;
        }

        if let Err(error) = self.store.download(&blob, &destination, identity).await {
            warn!(blob = name, %error, "transfer failed");
            return TransferOutcome::Failed;
        }

        if options.delete_after_copy {
            if let Err(error) = self.store.delete(&blob, identity).await {
                warn!(blob = name, %error, "delete after copy failed");
                return TransferOutcome::Failed;
            }
        }
        TransferOutcome::Success
    }

    /// True when the local file exists and the blob is not newer than it.
    async fn up_to_date(&self, blob: &Url, destination: &Path, identity: Option<&str>) -> bool {
        let Ok(metadata) = tokio::fs::metadata(destination).await else {
            return false;
        };
        let Ok(modified) = metadata.modified() else {
            return false;
        };
        let local: chrono::DateTime<chrono::Utc> = modified.into();
        match self.store.properties(blob, identity).await {
            Ok(Some(properties)) => properties
                .last_modified
                .map_or(false, |remote| remote <= local),
            _ => false,
        }
    }
}

#[async_trait]
impl Command for GetBlobs {
    fn spec(&self) -> CommandSpec {
        CommandSpec::new(
            "getblobs",
            "Downloads all blobs from a container into a local directory.",
            vec![
                ArgSpec::required(
                    "container",
                    None,
                    "URL of the container blobs are downloaded from. Example: https://myaccount.blob.core.windows.net/mycontainer",
                    ArgKind::Url,
                ),
                ArgSpec::required(
                    "directory",
                    None,
                    "Path of the local directory blobs are downloaded into. Examples: /home/avalanche/tmp/ or ./",
                    ArgKind::Str,
                ),
                ArgSpec::optional(
                    "prefix",
                    None,
                    "Only blobs whose name begins with this prefix are downloaded.",
                    ArgKind::Str,
                ),
                ArgSpec::optional(
                    "exclude",
                    None,
                    "Exclude blobs that match the given regular expression.",
                    ArgKind::Str,
                ),
                ArgSpec::flag(
                    "if-newer",
                    None,
                    "Download a blob only when a newer version exists in the container.",
                ),
                ArgSpec::flag(
                    "delete-after-copy",
                    None,
                    "Remove successfully downloaded blobs from the container.",
                ),
                schema::identity_arg(),
                schema::verbose_arg(),
            ],
        )
    }

    async fn run(&self, matches: &ArgMatches) -> Result<Vec<String>> {
        let options = GetBlobsOptions::bind(matches)?;
        self.execute(&options).await
    }
}
