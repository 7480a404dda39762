//! Prelude re-exporting the most commonly used items
//!
//! Allows typical integrations to pull everything in with a single
//! `use azblob_fetcher::prelude::*;`.

// Core result types
pub use crate::errors::{AppError, ErrorCategory, Result};

// Command contract and registry
pub use crate::app::commands::{
    ArgKind, ArgSpec, BatchReport, Command, CommandSpec, GetBlob, GetBlobs, GetToken, ListBlobs,
    SetBlob, TransferOutcome, registry,
};

// Collaborator seams and their production implementations
pub use crate::app::storage::{AzureBlobClient, BlobProperties, BlobStore, ClientConfig};
pub use crate::auth::{AccessToken, ImdsTokenProvider, TokenProvider};

// CLI lowering
pub use crate::cli::{build_cli, dispatch};
