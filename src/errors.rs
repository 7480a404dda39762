//! Error types for azblob_fetcher
//!
//! Every failure is classified by an explicit variant so callers match on
//! tags instead of inspecting message strings. The umbrella [`AppError`]
//! exposes a [`category`](AppError::category) for the user-facing
//! classification and logging.

use std::path::PathBuf;

use thiserror::Error;

/// Identity and token acquisition errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// No identity was supplied for an operation that authenticates
    #[error("Missing identity argument")]
    MissingIdentity,

    /// The token endpoint reported that the managed identity does not exist
    #[error("Managed identity not found")]
    IdentityNotFound { identity: String },

    /// HTTP transport failure while talking to the token endpoint
    #[error("HTTP request failed during token acquisition")]
    Http(#[from] reqwest::Error),

    /// The token endpoint rejected the request
    #[error("token endpoint rejected the request with HTTP {status}")]
    TokenEndpoint { status: u16, detail: String },

    /// The configured token endpoint is not a valid URL
    #[error("invalid token endpoint: {url}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Blob service and local file errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Token acquisition failed before the storage call was issued
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// HTTP transport failure
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// The blob service answered with a non-success status
    #[error("blob service returned HTTP {status} during {operation}")]
    Service {
        operation: &'static str,
        status: u16,
        detail: String,
    },

    /// A blob or container URL could not be parsed
    #[error("invalid URL: {url}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Local file required for an upload does not exist
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Local file I/O failure
    #[error("file I/O failed")]
    Io(#[from] std::io::Error),
}

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The exclusion argument is not a valid regular expression
    #[error("invalid exclusion pattern")]
    Pattern(#[from] regex::Error),

    /// Generic application error with context
    #[error("{message}")]
    Generic { message: String },
}

/// User-facing error classification, derived purely from variant tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    MissingIdentity,
    IdentityNotFound,
    LocalPrecondition,
    InvalidInput,
    General,
}

impl ErrorCategory {
    /// Short label for logging
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::MissingIdentity => "missing-identity",
            ErrorCategory::IdentityNotFound => "identity-not-found",
            ErrorCategory::LocalPrecondition => "local-precondition",
            ErrorCategory::InvalidInput => "invalid-input",
            ErrorCategory::General => "general",
        }
    }
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Classify the error for reporting
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::Auth(auth) | AppError::Storage(StorageError::Auth(auth)) => match auth {
                AuthError::MissingIdentity => ErrorCategory::MissingIdentity,
                AuthError::IdentityNotFound { .. } => ErrorCategory::IdentityNotFound,
                _ => ErrorCategory::General,
            },
            AppError::Storage(StorageError::FileNotFound { .. }) => {
                ErrorCategory::LocalPrecondition
            }
            AppError::Pattern(_) | AppError::Generic { .. } => ErrorCategory::InvalidInput,
            _ => ErrorCategory::General,
        }
    }
}

/// Render an error for the terminal: classified headline plus cause chain.
pub fn render(error: &AppError) -> String {
    use std::error::Error as _;

    let mut out = match error.category() {
        ErrorCategory::General => format!("General error: {error}"),
        _ => error.to_string(),
    };
    let mut source = error.source();
    while let Some(cause) = source {
        out.push_str(&format!("\n  caused by: {cause}"));
        source = cause.source();
    }
    out
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Token acquisition result type alias
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Blob service result type alias
pub type StorageResult<T> = std::result::Result<T, StorageError>;
