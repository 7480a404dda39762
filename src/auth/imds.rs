//! Token acquisition through the Azure Instance Metadata Service
//!
//! On an Azure VM the IMDS endpoint hands out bearer tokens for the
//! machine's managed identities without any embedded secret. The endpoint is
//! overridable through configuration so the flow can be exercised against a
//! local stub.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::{AccessToken, TokenProvider};
use crate::app::storage::ClientConfig;
use crate::constants::identity;
use crate::errors::{AuthError, AuthResult};

/// Successful IMDS token response payload
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// IMDS error payload
#[derive(Debug, Deserialize)]
struct ImdsErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
}

/// Token provider backed by the instance metadata service
#[derive(Debug)]
pub struct ImdsTokenProvider {
    http: reqwest::Client,
    endpoint: Url,
}

impl ImdsTokenProvider {
    /// Create a provider from the client configuration.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the HTTP client cannot be built or the
    /// configured endpoint is not a valid URL.
    pub fn new(config: &ClientConfig) -> AuthResult<Self> {
        let http = config.build_http_client()?;
        let endpoint =
            Url::parse(&config.imds_endpoint).map_err(|source| AuthError::InvalidEndpoint {
                url: config.imds_endpoint.clone(),
                source,
            })?;
        Ok(Self { http, endpoint })
    }
}

#[async_trait]
impl TokenProvider for ImdsTokenProvider {
    async fn token(&self, identity: Option<&str>, resource: &str) -> AuthResult<AccessToken> {
        let identity = match identity {
            Some(id) if !id.is_empty() => id,
            _ => return Err(AuthError::MissingIdentity),
        };

        debug!(identity, resource, "requesting token from instance metadata service");
        let response = self
            .http
            .get(self.endpoint.clone())
            .header(identity::METADATA_HEADER, "true")
            .query(&[
                ("api-version", identity::IMDS_API_VERSION),
                ("resource", resource),
                ("client_id", identity),
            ])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let payload: TokenResponse = response.json().await?;
            return Ok(AccessToken::new(payload.access_token));
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::BAD_REQUEST {
            if let Ok(detail) = serde_json::from_str::<ImdsErrorBody>(&body) {
                if detail.error_description.contains("Identity not found") {
                    warn!(identity, error = %detail.error, "managed identity not found");
                    return Err(AuthError::IdentityNotFound {
                        identity: identity.to_string(),
                    });
                }
            }
        }
        Err(AuthError::TokenEndpoint {
            status: status.as_u16(),
            detail: body,
        })
    }
}
