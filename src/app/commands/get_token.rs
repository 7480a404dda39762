//! `gettoken` — print a bearer token for the managed identity

use std::sync::Arc;

use async_trait::async_trait;
use clap::ArgMatches;
use tracing::debug;

use super::schema::{self, ArgKind, ArgSpec, CommandSpec};
use super::Command;
use crate::auth::{resource_for_endpoint, TokenProvider};
use crate::constants::identity;
use crate::errors::Result;

pub struct GetToken {
    tokens: Arc<dyn TokenProvider>,
}

#[derive(Debug, Clone)]
pub struct GetTokenOptions {
    pub endpoint: Option<String>,
    pub identity: Option<String>,
}

impl GetTokenOptions {
    fn bind(matches: &ArgMatches) -> Self {
        Self {
            endpoint: schema::string_value(matches, "endpoint"),
            identity: schema::string_value(matches, schema::IDENTITY),
        }
    }
}

impl GetToken {
    pub fn new(tokens: Arc<dyn TokenProvider>) -> Self {
        Self { tokens }
    }

    pub async fn execute(&self, options: &GetTokenOptions) -> Result<Vec<String>> {
        let endpoint = options
            .endpoint
            .as_deref()
            .filter(|endpoint| !endpoint.is_empty())
            .unwrap_or(identity::DEFAULT_TOKEN_ENDPOINT);
        let resource = resource_for_endpoint(endpoint);
        debug!(endpoint, resource, "requesting access token");
        let token = self
            .tokens
            .token(options.identity.as_deref(), &resource)
            .await?;
        Ok(vec![token.into_secret()])
    }
}

#[async_trait]
impl Command for GetToken {
    fn spec(&self) -> CommandSpec {
        CommandSpec::new(
            "gettoken",
            "Obtains an access token for a managed identity.",
            vec![
                ArgSpec::optional(
                    "endpoint",
                    Some('e'),
                    "Endpoint the token is requested for. Defaults to 'management'. Example: storage",
                    ArgKind::Str,
                ),
                schema::identity_arg(),
                schema::verbose_arg(),
            ],
        )
    }

    async fn run(&self, matches: &ArgMatches) -> Result<Vec<String>> {
        let options = GetTokenOptions::bind(matches);
        self.execute(&options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing::StaticTokenProvider;

    fn command() -> (Arc<StaticTokenProvider>, GetToken) {
        let tokens = Arc::new(StaticTokenProvider::new("tok-123"));
        (tokens.clone(), GetToken::new(tokens))
    }

    #[tokio::test]
    async fn prints_the_raw_token() {
        let (_, command) = command();
        let lines = command
            .execute(&GetTokenOptions {
                endpoint: None,
                identity: Some("my-identity".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(lines, vec!["tok-123"]);
    }

    #[tokio::test]
    async fn defaults_to_the_management_resource() {
        let (tokens, command) = command();
        command
            .execute(&GetTokenOptions {
                endpoint: None,
                identity: Some("my-identity".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(
            tokens.last_resource().as_deref(),
            Some("https://management.azure.com")
        );
    }

    #[tokio::test]
    async fn empty_endpoint_falls_back_to_management() {
        let (tokens, command) = command();
        command
            .execute(&GetTokenOptions {
                endpoint: Some(String::new()),
                identity: Some("my-identity".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(
            tokens.last_resource().as_deref(),
            Some("https://management.azure.com")
        );
    }

    #[tokio::test]
    async fn custom_endpoint_scopes_the_resource() {
        let (tokens, command) = command();
        command
            .execute(&GetTokenOptions {
                endpoint: Some("storage".to_string()),
                identity: Some("my-identity".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(
            tokens.last_resource().as_deref(),
            Some("https://storage.azure.com")
        );
    }
}
