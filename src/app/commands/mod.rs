//! Sub-command contract and registry
//!
//! Every operation implements [`Command`]: a pure, declarative
//! [`CommandSpec`] plus an `execute` over options bound from parsed input.
//! The registry is an explicit list built once at startup with its
//! collaborators injected; there is no global command state.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use async_trait::async_trait;
use clap::ArgMatches;

use crate::auth::TokenProvider;
use crate::errors::Result;

pub mod get_blob;
pub mod get_blobs;
pub mod get_token;
pub mod list_blobs;
pub mod schema;
pub mod set_blob;

pub use get_blob::GetBlob;
pub use get_blobs::{BatchReport, GetBlobs, TransferOutcome};
pub use get_token::GetToken;
pub use list_blobs::ListBlobs;
pub use schema::{ArgKind, ArgSpec, CommandSpec};
pub use set_blob::SetBlob;

use crate::app::storage::BlobStore;

/// A registered sub-command.
#[async_trait]
pub trait Command: Send + Sync {
    /// Declarative description of the command and its arguments. Pure and
    /// callable before any execution.
    fn spec(&self) -> CommandSpec;

    /// Bind the command's typed options from parsed input and execute,
    /// returning the lines to print.
    async fn run(&self, matches: &ArgMatches) -> Result<Vec<String>>;
}

/// Build the full command set.
pub fn registry(
    store: Arc<dyn BlobStore>,
    tokens: Arc<dyn TokenProvider>,
    cancel: Arc<AtomicBool>,
) -> Vec<Box<dyn Command>> {
    vec![
        Box::new(GetToken::new(tokens)),
        Box::new(GetBlob::new(store.clone())),
        Box::new(SetBlob::new(store.clone())),
        Box::new(ListBlobs::new(store.clone())),
        Box::new(GetBlobs::new(store, cancel)),
    ]
}
