//! federated_login - OpenID Connect authorization-code login for a host application
//!
//! Receives the identity provider's redirect, exchanges the code for an
//! identity token, maps the token's claims to a local user (creating one when
//! allowed) and establishes a session for it.

mod config;
mod coordination;
mod oauth2;
mod session;
mod storage;
mod userdb;
mod utils;


use std::sync::Arc;

pub use config::{ConfigError, FL_ROUTE_PREFIX, LoginConfig};

pub use coordination::{
    CallbackGate, LoginError, LoginOutcome, LoginService, LoginStage, LoginSuccess, MatchKind,
    ResolvedUser, email_local_part, resolve_user,
};

pub use oauth2::{
    CODE_PARAM, Claims, HttpTokenClient, IdTokenVerification, IdTokenVerifier, OAuth2Error,
    OidcTokenResponse, ProviderConfig, TokenClient, decode_claims, extract_authorization_code,
    parse_query,
};

pub use session::{CacheSessionManager, SessionConfig, SessionError, SessionManager, SessionUser};

pub use storage::{
    CacheData, CacheStore, InMemoryCacheStore, RedisCacheStore, StorageError,
    cache_store_from_env,
};

pub use userdb::{
    InMemoryUserDirectory, LocalUser, NewUser, SqliteUserDirectory, UserDirectory, UserError,
    user_directory_from_env,
};

pub use utils::UtilError;

/// Assemble a [`LoginService`] for `provider` with every other collaborator
/// taken from the environment
pub async fn init(provider: ProviderConfig) -> Result<LoginService, Box<dyn std::error::Error>> {
    let config = LoginConfig::from_env()?;

    if provider.verification == IdTokenVerification::None {
        tracing::warn!(
            "Identity token signatures are not verified; claims are trusted because they come straight from {}",
            provider.token_endpoint
        );
    }

    let tokens = Arc::new(HttpTokenClient::new(provider.clone())?);
    let verifier = Arc::new(IdTokenVerifier::new(provider)?);
    let users = user_directory_from_env().await?;
    let sessions = Arc::new(CacheSessionManager::new(
        cache_store_from_env().await?,
        SessionConfig::from_env()?,
    ));

    tracing::info!(
        username_attribute = %config.username_attribute,
        create_new_user = config.create_new_user,
        redirect = config.redirect_target().is_some(),
        "Federated login initialized"
    );

    Ok(LoginService::new(config, tokens, verifier, users, sessions))
}
