use std::env;
use std::time::Duration;

use url::Url;

use crate::config::{ConfigError, required};

use super::errors::OAuth2Error;

const DEFAULT_SCOPE: &str = "openid email profile";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// How much the identity token is trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdTokenVerification {
    /// Verify the signature against the provider's JWKS, plus `iss`, `aud` and expiry
    Signature,
    /// Decode the payload only. The token is trusted because it was received
    /// directly from the token endpoint over TLS.
    None,
}

impl std::str::FromStr for IdTokenVerification {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "signature" => Ok(Self::Signature),
            "none" => Ok(Self::None),
            other => Err(ConfigError::Invalid(
                "OIDC_ID_TOKEN_VERIFICATION".to_string(),
                format!("'{other}', expected 'signature' or 'none'"),
            )),
        }
    }
}

/// Identity provider endpoints and client credentials
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub issuer: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub jwks_uri: String,
    pub scope: String,
    pub verification: IdTokenVerification,
    /// Upper bound for every outbound call to the provider
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Endpoints follow the Cognito user pool layout unless overridden:
    /// `{issuer}/oauth2/authorize`, `{issuer}/oauth2/token` and
    /// `{issuer}/.well-known/jwks.json`.
    pub fn new(issuer: &str, client_id: &str, redirect_uri: &str) -> Self {
        let issuer = issuer.trim_end_matches('/').to_string();
        Self {
            authorization_endpoint: format!("{issuer}/oauth2/authorize"),
            token_endpoint: format!("{issuer}/oauth2/token"),
            jwks_uri: format!("{issuer}/.well-known/jwks.json"),
            issuer,
            client_id: client_id.to_string(),
            client_secret: None,
            redirect_uri: redirect_uri.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            verification: IdTokenVerification::Signature,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let issuer = required(&lookup, "OIDC_ISSUER_URL")?;
        let client_id = required(&lookup, "OIDC_CLIENT_ID")?;
        let redirect_uri = required(&lookup, "OIDC_REDIRECT_URI")?;

        let mut config = Self::new(&issuer, &client_id, &redirect_uri);
        config.client_secret = lookup("OIDC_CLIENT_SECRET").filter(|s| !s.is_empty());

        if let Some(url) = lookup("OIDC_AUTH_URL") {
            config.authorization_endpoint = url;
        }
        if let Some(url) = lookup("OIDC_TOKEN_URL") {
            config.token_endpoint = url;
        }
        if let Some(url) = lookup("OIDC_JWKS_URL") {
            config.jwks_uri = url;
        }
        if let Some(scope) = lookup("OIDC_SCOPE") {
            config.scope = scope;
        }
        if let Some(mode) = lookup("OIDC_ID_TOKEN_VERIFICATION") {
            config.verification = mode.parse()?;
        }
        if let Some(secs) = lookup("OIDC_HTTP_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                ConfigError::Invalid("OIDC_HTTP_TIMEOUT_SECS".to_string(), secs.clone())
            })?;
            if secs == 0 {
                return Err(ConfigError::Invalid(
                    "OIDC_HTTP_TIMEOUT_SECS".to_string(),
                    "must be at least 1".to_string(),
                ));
            }
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// URL of the provider's hosted login page for this client
    pub fn authorization_url(&self, state: Option<&str>) -> Result<String, OAuth2Error> {
        let mut url = Url::parse(&self.authorization_endpoint)
            .map_err(|e| OAuth2Error::InvalidUrl(format!("{}: {e}", self.authorization_endpoint)))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", &self.client_id)
                .append_pair("redirect_uri", &self.redirect_uri)
                .append_pair("scope", &self.scope);
            if let Some(state) = state {
                query.append_pair("state", state);
            }
        }
        Ok(url.into())
    }
}
