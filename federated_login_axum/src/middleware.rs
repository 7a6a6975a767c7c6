use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use http::{HeaderMap, StatusCode};

use federated_login::{CallbackGate, LoginOutcome, parse_query};

use super::session::AuthUser;
use super::state::FederatedLogin;

/// Run the login callback pipeline on every request
///
/// Install with `axum::middleware::from_fn_with_state`. Requests without an
/// authorization code, or whose login attempt aborts, reach the inner service
/// untouched. A completed login either answers `303 See Other` to the
/// configured homepage, or, with no homepage, lets the inner service render
/// the page for the freshly logged-in [`AuthUser`]. Both carry the new
/// session cookie.
pub async fn federated_login_callback(
    State(federated): State<FederatedLogin>,
    mut req: Request,
    next: Next,
) -> Response {
    let mut gate = req
        .extensions()
        .get::<CallbackGate>()
        .cloned()
        .unwrap_or_default();
    let params = parse_query(req.uri().query());

    let outcome = federated
        .login()
        .handle_request(&params, req.headers(), &mut gate)
        .await;
    req.extensions_mut().insert(gate);

    let success = match outcome {
        LoginOutcome::Completed(success) => success,
        LoginOutcome::Aborted { .. } => return next.run(req).await,
    };

    let mut response = match success.redirect_to.as_deref() {
        Some(target) => {
            tracing::debug!("Redirecting logged-in user to {}", target);
            Redirect::to(target).into_response()
        }
        None => {
            req.extensions_mut().insert(AuthUser::from(&success.user));
            next.run(req).await
        }
    };
    append_headers(response.headers_mut(), &success.headers);
    response
}

/// Hide the host's native username/password login route when
/// `OIDC_DISABLE_WP_LOGIN=true`
///
/// Layer it on that route only, e.g.
/// `.route_layer(from_fn_with_state(state, native_login_guard))`.
pub async fn native_login_guard(
    State(federated): State<FederatedLogin>,
    req: Request,
    next: Next,
) -> Response {
    if federated.login().config().native_login_enabled() {
        next.run(req).await
    } else {
        tracing::debug!("Native login disabled, refusing {}", req.uri().path());
        StatusCode::NOT_FOUND.into_response()
    }
}

/// Append rather than replace, so cookies set by the inner handler survive
fn append_headers(target: &mut HeaderMap, extra: &HeaderMap) {
    for (name, value) in extra {
        target.append(name.clone(), value.clone());
    }
}
