//! Fixtures shared by the unit tests

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use http::header::SET_COOKIE;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use federated_login::{
    CacheSessionManager, IdTokenVerification, IdTokenVerifier, InMemoryCacheStore,
    InMemoryUserDirectory, LoginConfig, LoginService, NewUser, OAuth2Error, OidcTokenResponse,
    ProviderConfig, SessionConfig, TokenClient, UserDirectory,
};

use crate::state::FederatedLogin;

/// Token endpoint stand-in: every code yields an id_token naming the user in
/// the code itself (`code=alice` logs in "alice")
#[derive(Default)]
pub(crate) struct CodeIsUsername {
    calls: AtomicUsize,
}

#[async_trait]
impl TokenClient for CodeIsUsername {
    async fn exchange_code(&self, code: &str) -> Result<OidcTokenResponse, OAuth2Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if code == "invalid" {
            return Err(OAuth2Error::TokenExchange("invalid_grant".to_string()));
        }
        Ok(OidcTokenResponse {
            id_token: unsigned_token(&serde_json::json!({ "cognito:username": code })),
            access_token: None,
            refresh_token: None,
            token_type: Some("Bearer".to_string()),
            expires_in: Some(3600),
        })
    }
}

pub(crate) fn unsigned_token(payload: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
    let payload = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{payload}.")
}

pub(crate) fn provider_config() -> ProviderConfig {
    let mut provider = ProviderConfig::new(
        "https://idp.example.com",
        "client-123",
        "https://app.example.com/",
    );
    provider.verification = IdTokenVerification::None;
    provider
}

pub(crate) async fn test_state(config: LoginConfig, existing: &[&str]) -> FederatedLogin {
    test_state_with_tokens(config, existing, Arc::new(CodeIsUsername::default())).await
}

pub(crate) async fn test_state_with_tokens(
    config: LoginConfig,
    existing: &[&str],
    tokens: Arc<CodeIsUsername>,
) -> FederatedLogin {
    let provider = provider_config();
    let users = Arc::new(InMemoryUserDirectory::new());
    for name in existing {
        users.create_user(new_user(name)).await.expect("seed user");
    }

    let sessions = Arc::new(CacheSessionManager::new(
        Box::new(InMemoryCacheStore::new()),
        SessionConfig::default(),
    ));
    let verifier = IdTokenVerifier::new(provider.clone()).expect("verifier");
    let login = LoginService::new(config, tokens, Arc::new(verifier), users, sessions);
    FederatedLogin::new(login, provider)
}

fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: None,
        label: username.to_string(),
    }
}

impl CodeIsUsername {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Log `username` in directly and return the `Cookie` header value for it
pub(crate) async fn login_cookie(state: &FederatedLogin, username: &str) -> String {
    let users = InMemoryUserDirectory::new();
    let user = users.create_user(new_user(username)).await.expect("user");
    let headers = state.login().sessions().log_in(&user).await.expect("session");
    headers
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("Set-Cookie")
        .to_string()
}
