//! Login and logout endpoints

use axum::{
    Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect},
    routing::get,
};
use http::{HeaderMap, StatusCode};
use serde::Deserialize;
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::config::FL_REDIRECT_AFTER_LOGOUT;
use super::error::IntoResponseError;
use super::state::FederatedLogin;

/// Router for the login link and logout, to be nested under `FL_ROUTE_PREFIX`
///
/// - `GET {FL_ROUTE_PREFIX}/login` redirects to the provider's authorize endpoint
/// - `GET {FL_ROUTE_PREFIX}/logout` ends the session and redirects to
///   `FL_REDIRECT_AFTER_LOGOUT`
///
/// The provider sends the browser back to `OIDC_REDIRECT_URI`, where
/// [`federated_login_callback`](crate::federated_login_callback) picks up the code.
pub fn federated_login_router(state: FederatedLogin) -> Router {
    Router::new()
        .route("/login", get(login))
        .route("/logout", get(logout))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
}

#[derive(Debug, Deserialize)]
struct LoginParams {
    /// Opaque value handed to the provider and echoed back on the callback
    state: Option<String>,
}

async fn login(
    State(federated): State<FederatedLogin>,
    Query(params): Query<LoginParams>,
) -> Result<Redirect, (StatusCode, String)> {
    let url = federated
        .provider()
        .authorization_url(params.state.as_deref())
        .into_response_error()?;
    tracing::debug!("Sending browser to the identity provider");
    Ok(Redirect::to(&url))
}

async fn logout(
    State(federated): State<FederatedLogin>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let response_headers = federated
        .login()
        .sessions()
        .log_out(&headers)
        .await
        .into_response_error()?;
    Ok((response_headers, Redirect::to(FL_REDIRECT_AFTER_LOGOUT.as_str())))
}
