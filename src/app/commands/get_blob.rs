//! `getblob` — download a single blob to a local file

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clap::ArgMatches;
use tracing::debug;
use url::Url;

use super::schema::{self, ArgKind, ArgSpec, CommandSpec};
use super::Command;
use crate::app::storage::{parse_url, BlobStore};
use crate::errors::Result;

pub struct GetBlob {
    store: Arc<dyn BlobStore>,
}

#[derive(Debug, Clone)]
pub struct GetBlobOptions {
    pub blob: Url,
    pub file: PathBuf,
    pub identity: Option<String>,
}

impl GetBlobOptions {
    fn bind(matches: &ArgMatches) -> Result<Self> {
        let blob = schema::required_value(matches, "blob")?;
        Ok(Self {
            blob: parse_url(&blob)?,
            file: PathBuf::from(schema::required_value(matches, "file")?),
            identity: schema::string_value(matches, schema::IDENTITY),
        })
    }
}

impl GetBlob {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, options: &GetBlobOptions) -> Result<Vec<String>> {
        debug!(blob = %options.blob, file = %options.file.display(), "downloading blob");
        self.store
            .download(&options.blob, &options.file, options.identity.as_deref())
            .await?;
        Ok(vec!["Success".to_string()])
    }
}

#[async_trait]
impl Command for GetBlob {
    fn spec(&self) -> CommandSpec {
        CommandSpec::new(
            "getblob",
            "Downloads a single blob to a local file.",
            vec![
                ArgSpec::required(
                    "blob",
                    None,
                    "URL of the blob to download. Example: https://myaccount.blob.core.windows.net/mycontainer/readme.txt",
                    ArgKind::Url,
                ),
                ArgSpec::required(
                    "file",
                    None,
                    "Path of the local file the blob is saved to. Example: ./readme.txt",
                    ArgKind::Str,
                ),
                schema::identity_arg(),
                schema::verbose_arg(),
            ],
        )
    }

    async fn run(&self, matches: &ArgMatches) -> Result<Vec<String>> {
        let options = GetBlobOptions::bind(matches)?;
        self.execute(&options).await
    }
}
