use async_trait::async_trait;

use crate::oauth2::config::ProviderConfig;
use crate::oauth2::errors::OAuth2Error;
use crate::oauth2::types::OidcTokenResponse;

/// Trades an authorization code for tokens
#[async_trait]
pub trait TokenClient: Send + Sync {
    /// Exchange `code` at the token endpoint. Called at most once per code.
    async fn exchange_code(&self, code: &str) -> Result<OidcTokenResponse, OAuth2Error>;
}

/// Token endpoint client backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpTokenClient {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl HttpTokenClient {
    pub fn new(config: ProviderConfig) -> Result<Self, OAuth2Error> {
        let client = super::utils::build_client(config.timeout)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl TokenClient for HttpTokenClient {
    async fn exchange_code(&self, code: &str) -> Result<OidcTokenResponse, OAuth2Error> {
        let mut request = self.client.post(&self.config.token_endpoint).form(&[
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ]);

        // Confidential clients authenticate with HTTP Basic (client_secret_basic)
        if let Some(secret) = &self.config.client_secret {
            request = request.basic_auth(&self.config.client_id, Some(secret));
        }

        let response = request
            .send()
            .await
            .map_err(|e| OAuth2Error::TokenExchange(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("Token endpoint error body: {}", body);
            return Err(OAuth2Error::TokenExchange(format!(
                "token endpoint returned {status}"
            )));
        }

        let response_body = response
            .text()
            .await
            .map_err(|e| OAuth2Error::TokenExchange(e.to_string()))?;

        let token_response: OidcTokenResponse = serde_json::from_str(&response_body)
            .map_err(|e| OAuth2Error::TokenExchange(format!("malformed token response: {e}")))?;

        tracing::debug!(
            has_access_token = token_response.access_token.is_some(),
            has_refresh_token = token_response.refresh_token.is_some(),
            "Token exchange succeeded"
        );

        Ok(token_response)
    }
}
