//! Axum-based mock identity provider
//!
//! Serves `/oauth2/token` and `/.well-known/jwks.json` on 127.0.0.1 with an
//! OS-assigned port. Codes are registered up front and are single-use.

use axum::{
    Form, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use base64::{Engine as _, engine::general_purpose::STANDARD, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const MOCK_CLIENT_ID: &str = "mock-client";
pub const MOCK_CLIENT_SECRET: &str = "mock-secret";
pub const MOCK_REDIRECT_URI: &str = "https://app.example.com/";
pub const MOCK_KEY_ID: &str = "mock-key-1";
const SIGNING_SECRET: &[u8] = b"mock-provider-signing-secret-0123456789";

/// What the token endpoint should do for a registered code
#[derive(Clone, Debug)]
pub enum TokenBehavior {
    /// Issue a signed id_token carrying these extra claims
    Claims(Value),
    /// Answer with this status and an OAuth2 error body
    Error(StatusCode),
    /// Answer 200 with a body that has no id_token
    Malformed,
    /// Sign the id_token with a key the JWKS does not publish
    WrongKey(Value),
    /// Hold the request open this long before answering
    Hang(Duration),
}

#[derive(Clone, Default)]
pub struct MockState {
    issuer: Arc<Mutex<String>>,
    codes: Arc<Mutex<HashMap<String, TokenBehavior>>>,
    token_requests: Arc<AtomicUsize>,
    jwks_requests: Arc<AtomicUsize>,
}

pub struct MockProvider {
    pub base_url: String,
    state: MockState,
}

impl MockProvider {
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock provider");
        let base_url = format!("http://{}", listener.local_addr().expect("local addr"));

        let state = MockState::default();
        *state.issuer.lock().unwrap() = base_url.clone();

        let app = Router::new()
            .route("/oauth2/token", post(token))
            .route("/.well-known/jwks.json", get(jwks))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock provider");
        });

        Self { base_url, state }
    }

    /// Register `code` so the token endpoint answers it once
    pub fn register_code(&self, code: &str, behavior: TokenBehavior) {
        self.state
            .codes
            .lock()
            .unwrap()
            .insert(code.to_string(), behavior);
    }

    pub fn token_requests(&self) -> usize {
        self.state.token_requests.load(Ordering::SeqCst)
    }

    pub fn jwks_requests(&self) -> usize {
        self.state.jwks_requests.load(Ordering::SeqCst)
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_secs()
}

fn oauth_error(status: StatusCode, error: &str) -> Response {
    (status, Json(json!({ "error": error }))).into_response()
}

fn client_authenticated(headers: &HeaderMap) -> bool {
    let expected = format!(
        "Basic {}",
        STANDARD.encode(format!("{MOCK_CLIENT_ID}:{MOCK_CLIENT_SECRET}"))
    );
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected)
}

fn sign(issuer: &str, extra: &Value, secret: &[u8]) -> String {
    let now = now();
    let mut claims = json!({
        "iss": issuer,
        "aud": MOCK_CLIENT_ID,
        "sub": "5c1b7a2e-0d4f-4e55-9a0e-3f1d2b7c9e11",
        "token_use": "id",
        "iat": now,
        "exp": now + 3600,
    });
    if let (Some(claims), Some(extra)) = (claims.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            claims.insert(key.clone(), value.clone());
        }
    }

    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(MOCK_KEY_ID.to_string());
    jsonwebtoken::encode(&header, &claims, &EncodingKey::from_secret(secret)).expect("sign")
}

async fn token(
    State(state): State<MockState>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.token_requests.fetch_add(1, Ordering::SeqCst);

    if !client_authenticated(&headers) {
        return oauth_error(StatusCode::UNAUTHORIZED, "invalid_client");
    }
    if form.get("grant_type").map(String::as_str) != Some("authorization_code")
        || form.get("client_id").map(String::as_str) != Some(MOCK_CLIENT_ID)
        || form.get("redirect_uri").map(String::as_str) != Some(MOCK_REDIRECT_URI)
    {
        return oauth_error(StatusCode::BAD_REQUEST, "invalid_request");
    }

    let behavior = form
        .get("code")
        .and_then(|code| state.codes.lock().unwrap().remove(code));
    let issuer = state.issuer.lock().unwrap().clone();

    match behavior {
        None => oauth_error(StatusCode::BAD_REQUEST, "invalid_grant"),
        Some(TokenBehavior::Error(status)) => oauth_error(status, "server_error"),
        Some(TokenBehavior::Malformed) => {
            Json(json!({ "access_token": "a", "token_type": "Bearer" })).into_response()
        }
        Some(TokenBehavior::Claims(extra)) => Json(json!({
            "id_token": sign(&issuer, &extra, SIGNING_SECRET),
            "access_token": "mock-access-token",
            "refresh_token": "mock-refresh-token",
            "token_type": "Bearer",
            "expires_in": 3600
        }))
        .into_response(),
        Some(TokenBehavior::Hang(delay)) => {
            tokio::time::sleep(delay).await;
            oauth_error(StatusCode::GATEWAY_TIMEOUT, "temporarily_unavailable")
        }
        Some(TokenBehavior::WrongKey(extra)) => Json(json!({
            "id_token": sign(&issuer, &extra, b"some-other-secret-nobody-published"),
            "token_type": "Bearer"
        }))
        .into_response(),
    }
}

async fn jwks(State(state): State<MockState>) -> Json<Value> {
    state.jwks_requests.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "keys": [{
            "kty": "oct",
            "kid": MOCK_KEY_ID,
            "alg": "HS256",
            "use": "sig",
            "k": URL_SAFE_NO_PAD.encode(SIGNING_SECRET)
        }]
    }))
}
