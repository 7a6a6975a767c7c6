use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::oauth2::config::{IdTokenVerification, ProviderConfig};
use crate::oauth2::errors::OAuth2Error;
use crate::oauth2::types::Claims;
use crate::utils::base64url_decode;

const JWKS_CACHE_SECS: i64 = 600;
const CLOCK_SKEW_SECS: u64 = 5;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Jwks {
    keys: Vec<Jwk>,
}

impl Jwks {
    fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|key| key.kid == kid)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct Jwk {
    kty: String,
    kid: String,
    alg: Option<String>,
    n: Option<String>,
    e: Option<String>,
    x: Option<String>,
    y: Option<String>,
    k: Option<String>,
}

struct CachedJwks {
    jwks: Jwks,
    expires_at: DateTime<Utc>,
}

/// Decode an identity token's payload without checking its signature
///
/// The token must have exactly three dot-separated segments; the middle one is
/// base64url-encoded JSON and must be an object.
pub fn decode_claims(token: &str) -> Result<Claims, OAuth2Error> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(OAuth2Error::InvalidTokenFormat);
    }
    let payload = base64url_decode(parts[1])?;
    let claims: Map<String, Value> = serde_json::from_slice(&payload)?;
    Ok(Claims::from(claims))
}

/// Turns identity tokens into claims according to the configured trust mode
pub struct IdTokenVerifier {
    client: reqwest::Client,
    config: ProviderConfig,
    jwks_cache: Mutex<Option<CachedJwks>>,
}

impl IdTokenVerifier {
    pub fn new(config: ProviderConfig) -> Result<Self, OAuth2Error> {
        let client = super::utils::build_client(config.timeout)?;
        Ok(Self {
            client,
            config,
            jwks_cache: Mutex::new(None),
        })
    }

    pub async fn parse(&self, token: &str) -> Result<Claims, OAuth2Error> {
        match self.config.verification {
            IdTokenVerification::None => decode_claims(token),
            IdTokenVerification::Signature => self.verify(token).await,
        }
    }

    async fn verify(&self, token: &str) -> Result<Claims, OAuth2Error> {
        if token.split('.').count() != 3 {
            return Err(OAuth2Error::InvalidTokenFormat);
        }

        let header = jsonwebtoken::decode_header(token)?;
        let kid = header
            .kid
            .ok_or_else(|| OAuth2Error::MissingKeyComponent("kid".to_string()))?;
        tracing::debug!("Verifying id_token signed with {:?}, kid {}", header.alg, kid);

        let jwk = self.find_key(&kid).await?;
        let decoding_key = convert_jwk_to_decoding_key(&jwk, header.alg)?;

        let mut validation = Validation::new(header.alg);
        validation.set_audience(&[self.config.client_id.as_str()]);
        validation.set_issuer(&[self.config.issuer.as_str()]);
        validation.validate_nbf = true;
        validation.leeway = CLOCK_SKEW_SECS;

        let data = jsonwebtoken::decode::<Map<String, Value>>(token, &decoding_key, &validation)?;
        Ok(Claims::from(data.claims))
    }

    /// Look the key up in the cached JWKS, refetching once when the cache is
    /// stale or does not know `kid` (the provider may have rotated keys)
    async fn find_key(&self, kid: &str) -> Result<Jwk, OAuth2Error> {
        {
            let cache = self.jwks_cache.lock().await;
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Utc::now() {
                    if let Some(jwk) = cached.jwks.find(kid) {
                        return Ok(jwk.clone());
                    }
                }
            }
        }

        let jwks = self.fetch_jwks().await?;
        let jwk = jwks.find(kid).cloned();
        *self.jwks_cache.lock().await = Some(CachedJwks {
            jwks,
            expires_at: Utc::now() + Duration::seconds(JWKS_CACHE_SECS),
        });

        jwk.ok_or_else(|| OAuth2Error::NoMatchingKey(kid.to_string()))
    }

    async fn fetch_jwks(&self) -> Result<Jwks, OAuth2Error> {
        tracing::debug!("Fetching JWKS from {}", self.config.jwks_uri);
        let response = self
            .client
            .get(&self.config.jwks_uri)
            .send()
            .await
            .map_err(|e| OAuth2Error::JwksFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OAuth2Error::JwksFetch(format!(
                "JWKS endpoint returned {}",
                response.status()
            )));
        }

        response
            .json::<Jwks>()
            .await
            .map_err(|e| OAuth2Error::JwksFetch(e.to_string()))
    }

    #[cfg(test)]
    pub(crate) fn with_cached_jwks(config: ProviderConfig, jwks: Jwks) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            jwks_cache: Mutex::new(Some(CachedJwks {
                jwks,
                expires_at: Utc::now() + Duration::seconds(JWKS_CACHE_SECS),
            })),
        }
    }
}

fn key_component<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, OAuth2Error> {
    value
        .as_deref()
        .ok_or_else(|| OAuth2Error::MissingKeyComponent(name.to_string()))
}

/// Build a decoding key for `alg` from `jwk`, refusing algorithms that do not
/// belong to the key's type
fn convert_jwk_to_decoding_key(jwk: &Jwk, alg: Algorithm) -> Result<DecodingKey, OAuth2Error> {
    if let Some(jwk_alg) = &jwk.alg {
        match jwk_alg.parse::<Algorithm>() {
            Ok(expected) if expected == alg => {}
            _ => {
                return Err(OAuth2Error::UnsupportedAlgorithm(format!(
                    "token uses {alg:?} but key {} is for {jwk_alg}",
                    jwk.kid
                )));
            }
        }
    }

    match (jwk.kty.as_str(), alg) {
        (
            "RSA",
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512,
        ) => Ok(DecodingKey::from_rsa_components(
            key_component(&jwk.n, "n")?,
            key_component(&jwk.e, "e")?,
        )?),
        ("EC", Algorithm::ES256 | Algorithm::ES384) => Ok(DecodingKey::from_ec_components(
            key_component(&jwk.x, "x")?,
            key_component(&jwk.y, "y")?,
        )?),
        ("oct", Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) => {
            let secret = base64url_decode(key_component(&jwk.k, "k")?)?;
            Ok(DecodingKey::from_secret(&secret))
        }
        (kty, alg) => Err(OAuth2Error::UnsupportedAlgorithm(format!(
            "{alg:?} with {kty} key"
        ))),
    }
}
