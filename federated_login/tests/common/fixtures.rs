use chrono::Utc;
use federated_login::{
    CacheSessionManager, CallbackGate, HttpTokenClient, IdTokenVerifier, InMemoryCacheStore,
    InMemoryUserDirectory, LocalUser, LoginConfig, LoginOutcome, LoginService, ProviderConfig,
    SessionConfig, parse_query,
};
use http::{HeaderMap, HeaderValue, header::COOKIE, header::SET_COOKIE};
use std::sync::Arc;
use std::time::Duration;

use super::mock_provider::{MOCK_CLIENT_ID, MOCK_CLIENT_SECRET, MOCK_REDIRECT_URI, MockProvider};

pub struct TestApp {
    pub login: LoginService,
    pub users: Arc<InMemoryUserDirectory>,
    pub sessions: Arc<CacheSessionManager>,
}

pub fn provider_config(provider: &MockProvider) -> ProviderConfig {
    let mut config = ProviderConfig::new(&provider.base_url, MOCK_CLIENT_ID, MOCK_REDIRECT_URI);
    config.client_secret = Some(MOCK_CLIENT_SECRET.to_string());
    config.timeout = Duration::from_secs(5);
    config
}

pub fn existing_user(username: &str) -> LocalUser {
    LocalUser {
        id: format!("existing-{username}"),
        username: username.to_string(),
        email: None,
        label: username.to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn test_app(
    provider: ProviderConfig,
    config: LoginConfig,
    existing: &[&str],
) -> TestApp {
    let users = Arc::new(InMemoryUserDirectory::with_users(
        existing.iter().map(|name| existing_user(name)),
    ));
    let sessions = Arc::new(CacheSessionManager::new(
        Box::new(InMemoryCacheStore::new()),
        SessionConfig::default(),
    ));
    let login = LoginService::new(
        config,
        Arc::new(HttpTokenClient::new(provider.clone()).expect("token client")),
        Arc::new(IdTokenVerifier::new(provider).expect("verifier")),
        users.clone(),
        sessions.clone(),
    );
    TestApp {
        login,
        users,
        sessions,
    }
}

/// Simulate the browser arriving with `query`
pub async fn callback(app: &TestApp, query: &str, headers: &HeaderMap) -> LoginOutcome {
    let params = parse_query(Some(query));
    app.login
        .handle_request(&params, headers, &mut CallbackGate::new())
        .await
}

/// Cookie header a browser would send after receiving `response`
pub fn cookie_from(response: &HeaderMap) -> HeaderMap {
    let pair = response
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("Set-Cookie header");
    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, HeaderValue::from_str(pair).expect("cookie value"));
    headers
}
