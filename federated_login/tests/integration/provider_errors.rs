use federated_login::{
    IdTokenVerification, LoginConfig, LoginError, LoginOutcome, LoginStage, OAuth2Error,
};
use http::{HeaderMap, StatusCode};
use serde_json::json;
use std::time::{Duration, Instant};

use crate::common::mock_provider::TokenBehavior;
use crate::common::{MockProvider, callback, provider_config, test_app};

fn aborted(outcome: LoginOutcome) -> (LoginStage, LoginError) {
    match outcome {
        LoginOutcome::Aborted { stage, reason } => (stage, reason),
        LoginOutcome::Completed(success) => panic!("expected abort, got {success:?}"),
    }
}

#[tokio::test]
async fn test_unknown_code_is_exchange_failure() {
    let provider = MockProvider::start().await;
    let app = test_app(provider_config(&provider), LoginConfig::default(), &["alice"]);

    let (stage, reason) = aborted(callback(&app, "code=never-issued", &HeaderMap::new()).await);
    assert_eq!(stage, LoginStage::CodeFound);
    assert!(matches!(
        reason,
        LoginError::ExchangeFailed(OAuth2Error::TokenExchange(_))
    ));
}

#[tokio::test]
async fn test_code_is_single_use() {
    let provider = MockProvider::start().await;
    let app = test_app(provider_config(&provider), LoginConfig::default(), &["alice"]);
    provider.register_code("once", TokenBehavior::Claims(json!({ "cognito:username": "alice" })));

    assert!(callback(&app, "code=once", &HeaderMap::new()).await.is_completed());
    let (_, reason) = aborted(callback(&app, "code=once", &HeaderMap::new()).await);
    assert!(matches!(reason, LoginError::ExchangeFailed(_)));
    assert_eq!(provider.token_requests(), 2);
}

#[tokio::test]
async fn test_provider_error_status_is_exchange_failure() {
    let provider = MockProvider::start().await;
    let app = test_app(provider_config(&provider), LoginConfig::default(), &["alice"]);
    provider.register_code("boom", TokenBehavior::Error(StatusCode::INTERNAL_SERVER_ERROR));

    let (stage, reason) = aborted(callback(&app, "code=boom", &HeaderMap::new()).await);
    assert_eq!(stage, LoginStage::CodeFound);
    assert!(matches!(reason, LoginError::ExchangeFailed(_)));
    assert_eq!(provider.jwks_requests(), 0);
}

#[tokio::test]
async fn test_response_without_id_token_is_exchange_failure() {
    let provider = MockProvider::start().await;
    let app = test_app(provider_config(&provider), LoginConfig::default(), &["alice"]);
    provider.register_code("odd", TokenBehavior::Malformed);

    let (_, reason) = aborted(callback(&app, "code=odd", &HeaderMap::new()).await);
    assert!(matches!(reason, LoginError::ExchangeFailed(_)));
}

#[tokio::test]
async fn test_wrong_client_secret_is_exchange_failure() {
    let provider = MockProvider::start().await;
    let mut config = provider_config(&provider);
    config.client_secret = Some("not-the-secret".to_string());
    let app = test_app(config, LoginConfig::default(), &["alice"]);
    provider.register_code("code", TokenBehavior::Claims(json!({ "cognito:username": "alice" })));

    let (_, reason) = aborted(callback(&app, "code=code", &HeaderMap::new()).await);
    assert!(matches!(reason, LoginError::ExchangeFailed(_)));
}

#[tokio::test]
async fn test_unreachable_provider_is_exchange_failure() {
    let provider = MockProvider::start().await;
    let mut config = provider_config(&provider);
    config.token_endpoint = "http://127.0.0.1:9/oauth2/token".to_string();
    let app = test_app(config, LoginConfig::default(), &["alice"]);

    let (_, reason) = aborted(callback(&app, "code=abc", &HeaderMap::new()).await);
    assert!(matches!(reason, LoginError::ExchangeFailed(_)));
}

#[tokio::test]
async fn test_stalled_token_endpoint_times_out() {
    // Given a provider that holds the token request open far past the client timeout
    let provider = MockProvider::start().await;
    let mut config = provider_config(&provider);
    config.timeout = Duration::from_secs(1);
    let app = test_app(config, LoginConfig::default(), &["alice"]);
    provider.register_code("slow", TokenBehavior::Hang(Duration::from_secs(10)));

    // When the browser arrives with that code
    let started = Instant::now();
    let (stage, reason) = aborted(callback(&app, "code=slow", &HeaderMap::new()).await);
    let elapsed = started.elapsed();

    // Then the run aborts at the exchange, close to the configured timeout
    assert_eq!(stage, LoginStage::CodeFound);
    assert!(matches!(
        reason,
        LoginError::ExchangeFailed(OAuth2Error::TokenExchange(_))
    ));
    assert!(elapsed < Duration::from_secs(4), "took {elapsed:?}");
    assert_eq!(provider.token_requests(), 1);
    assert_eq!(provider.jwks_requests(), 0);
    assert_eq!(app.users.len().await, 1);
}

#[tokio::test]
async fn test_token_signed_with_unpublished_key_is_rejected() {
    let provider = MockProvider::start().await;
    let app = test_app(provider_config(&provider), LoginConfig::default(), &["alice"]);
    provider.register_code(
        "forged",
        TokenBehavior::WrongKey(json!({ "cognito:username": "alice" })),
    );

    let (stage, reason) = aborted(callback(&app, "code=forged", &HeaderMap::new()).await);
    assert_eq!(stage, LoginStage::TokenExchanged);
    assert!(matches!(reason, LoginError::InvalidIdToken(_)));
}

#[tokio::test]
async fn test_unverified_mode_accepts_token_without_jwks() {
    let provider = MockProvider::start().await;
    let mut config = provider_config(&provider);
    config.verification = IdTokenVerification::None;
    let app = test_app(config, LoginConfig::default(), &["alice"]);
    provider.register_code("code", TokenBehavior::Claims(json!({ "cognito:username": "alice" })));

    assert!(callback(&app, "code=code", &HeaderMap::new()).await.is_completed());
    assert_eq!(provider.jwks_requests(), 0);
}

#[tokio::test]
async fn test_token_from_other_issuer_is_rejected() {
    let provider = MockProvider::start().await;
    let mut config = provider_config(&provider);
    // The provider signs for its own issuer URL; pretend we expect another one
    config.issuer = "https://cognito-idp.example.com/pool".to_string();
    let app = test_app(config, LoginConfig::default(), &["alice"]);
    provider.register_code("code", TokenBehavior::Claims(json!({ "cognito:username": "alice" })));

    let (_, reason) = aborted(callback(&app, "code=code", &HeaderMap::new()).await);
    assert!(matches!(reason, LoginError::InvalidIdToken(_)));
}
