//! Managed identity authentication
//!
//! The [`TokenProvider`] trait is the seam between commands and the token
//! source: production code uses the instance metadata service
//! ([`ImdsTokenProvider`]), tests substitute a canned provider.

use std::fmt;

use async_trait::async_trait;

use crate::constants::identity;
use crate::errors::AuthResult;

pub mod imds;

pub use imds::ImdsTokenProvider;

/// Bearer token returned by a token provider.
///
/// The secret is kept out of `Debug` output so tokens never leak into logs.
#[derive(Clone)]
pub struct AccessToken {
    secret: String,
}

impl AccessToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// The raw bearer token
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Consume the token, yielding the raw string
    pub fn into_secret(self) -> String {
        self.secret
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Resource identifier a token is requested for.
///
/// An empty endpoint falls back to the management endpoint.
pub fn resource_for_endpoint(endpoint: &str) -> String {
    let endpoint = if endpoint.is_empty() {
        identity::DEFAULT_TOKEN_ENDPOINT
    } else {
        endpoint
    };
    format!("https://{endpoint}.azure.com")
}

/// Source of bearer tokens for a managed identity.
///
/// Implementations must reject an absent or empty identity with
/// [`AuthError::MissingIdentity`](crate::errors::AuthError::MissingIdentity)
/// before any network I/O.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self, identity: Option<&str>, resource: &str) -> AuthResult<AccessToken>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Token provider returning a fixed secret and recording every request.
    pub(crate) struct StaticTokenProvider {
        secret: String,
        pub requests: Mutex<Vec<(Option<String>, String)>>,
    }

    impl StaticTokenProvider {
        pub fn new(secret: &str) -> Self {
            Self {
                secret: secret.to_string(),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn last_resource(&self) -> Option<String> {
            self.requests
                .lock()
                .unwrap()
                .last()
                .map(|(_, resource)| resource.clone())
        }
    }

    #[async_trait]
    impl TokenProvider for StaticTokenProvider {
        async fn token(&self, identity: Option<&str>, resource: &str) -> AuthResult<AccessToken> {
            self.requests
                .lock()
                .unwrap()
                .push((identity.map(String::from), resource.to_string()));
            Ok(AccessToken::new(self.secret.clone()))
        }
    }
}
