//! azblob_fetcher CLI application
//!
//! Azure blob storage operations authenticated with a managed identity:
//! token retrieval, single-blob get/set, listing, and concurrent batch
//! container downloads.

use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use azblob_fetcher::app::commands::{registry, schema};
use azblob_fetcher::app::storage::{AzureBlobClient, BlobStore, ClientConfig};
use azblob_fetcher::auth::{ImdsTokenProvider, TokenProvider};
use azblob_fetcher::cli::{build_cli, dispatch};
use azblob_fetcher::errors::{render, Result};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        tracing::error!(category = error.category().label(), "command failed");
        eprintln!("Error: {}", render(&error));
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let config = ClientConfig::from_env();
    let tokens: Arc<dyn TokenProvider> = Arc::new(ImdsTokenProvider::new(&config)?);
    let store: Arc<dyn BlobStore> = Arc::new(AzureBlobClient::new(&config, tokens.clone())?);
    let cancel = Arc::new(AtomicBool::new(false));
    let commands = registry(store, tokens, cancel.clone());

    let matches = build_cli(&commands).get_matches();
    init_logging(&matches);
    info!("azblob_fetcher v{} starting", env!("CARGO_PKG_VERSION"));

    // A batch in flight finishes the transfers it already started and then
    // reports what completed.
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, no new transfers will start");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let lines = dispatch(&commands, &matches).await?;
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

/// Initialize logging from the command's verbose flag
fn init_logging(matches: &clap::ArgMatches) {
    let verbose = matches
        .subcommand()
        .map(|(_, sub_matches)| sub_matches.get_flag(schema::VERBOSE))
        .unwrap_or(false);
    let level = if verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("azblob_fetcher={level}").parse().unwrap());
    fmt().with_env_filter(filter).with_target(false).init();
}
