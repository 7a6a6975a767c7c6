mod config;
mod errors;
mod main;
mod types;

pub use config::{IdTokenVerification, ProviderConfig};
pub use errors::OAuth2Error;
pub use main::{
    CODE_PARAM, HttpTokenClient, IdTokenVerifier, TokenClient, decode_claims,
    extract_authorization_code, parse_query,
};
pub use types::{Claims, OidcTokenResponse};
