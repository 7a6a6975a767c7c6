use thiserror::Error;

use crate::utils::UtilError;

#[derive(Debug, Error, Clone)]
pub enum OAuth2Error {
    #[error("Token exchange error: {0}")]
    TokenExchange(String),

    #[error("Id token error: {0}")]
    IdToken(String),

    #[error("Invalid token format")]
    InvalidTokenFormat,

    #[error("JWKS fetch error: {0}")]
    JwksFetch(String),

    #[error("No matching key found in JWKS for kid {0}")]
    NoMatchingKey(String),

    #[error("Missing key component: {0}")]
    MissingKeyComponent(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Serde error: {0}")]
    Serde(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Error from utils operations
    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),
}

impl From<jsonwebtoken::errors::Error> for OAuth2Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::IdToken(err.to_string())
    }
}

impl From<serde_json::Error> for OAuth2Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}
