//! Application constants for azblob_fetcher
//!
//! Centralizes the constants used throughout the application, organized by
//! functional domain.

use std::time::Duration;

/// Environment variable names
pub mod env {
    /// Overrides the instance metadata service token endpoint.
    ///
    /// Pointing this at a local stub allows exercising the token flow
    /// without a real Azure VM.
    pub const IMDS_ENDPOINT: &str = "AZBLOB_IMDS_ENDPOINT";
}

/// Managed identity and token acquisition
pub mod identity {
    /// Azure Instance Metadata Service token endpoint
    pub const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";

    /// IMDS API version understood by this client
    pub const IMDS_API_VERSION: &str = "2018-02-01";

    /// Header required on every IMDS request
    pub const METADATA_HEADER: &str = "Metadata";

    /// Endpoint used for `gettoken` when none is given
    pub const DEFAULT_TOKEN_ENDPOINT: &str = "management";

    /// Resource identifier for blob storage tokens
    pub const STORAGE_RESOURCE: &str = "https://storage.azure.com";
}

/// Blob service request constants
pub mod storage {
    /// Storage REST API version sent with every request
    pub const API_VERSION: &str = "2021-08-06";

    /// Header carrying the API version
    pub const VERSION_HEADER: &str = "x-ms-version";

    /// Header carrying the request timestamp
    pub const DATE_HEADER: &str = "x-ms-date";

    /// Header selecting the blob type on upload
    pub const BLOB_TYPE_HEADER: &str = "x-ms-blob-type";

    /// Blob type used for uploads
    pub const BLOCK_BLOB: &str = "BlockBlob";

    /// Temporary file suffix for atomic downloads
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";
}

/// HTTP client configuration
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "azblob-fetcher/0.1.0";

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
}

/// Retry policy for transient transfer failures
pub mod limits {
    /// Maximum retry attempts for a failed download
    pub const MAX_RETRIES: u32 = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const RETRY_BASE_DELAY_MS: u64 = 500;
}

/// Batch transfer configuration
pub mod batch {
    /// Number of blobs transferred concurrently
    pub const DEFAULT_WORKER_COUNT: usize = 4;
}

// Re-export commonly used constants for convenience
pub use batch::DEFAULT_WORKER_COUNT;
pub use http::{DEFAULT_TIMEOUT as HTTP_TIMEOUT, USER_AGENT};
pub use limits::{MAX_RETRIES, RETRY_BASE_DELAY_MS};
