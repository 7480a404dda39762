//! Core application logic
//!
//! The blob store client and the sub-command set built on top of it.

pub mod commands;
pub mod storage;

// Re-export the main public API
pub use commands::{registry, Command, CommandSpec};
pub use storage::{AzureBlobClient, BlobStore, ClientConfig};
