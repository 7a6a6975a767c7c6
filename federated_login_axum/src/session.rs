use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    response::{IntoResponse, Redirect, Response},
};
use http::{Method, StatusCode, request::Parts};

use federated_login::{LocalUser, SessionUser};

use super::config::FL_REDIRECT_ANON;
use super::state::FederatedLogin;

pub struct AuthRedirect {
    method: Method,
}

impl AuthRedirect {
    fn new(method: Method) -> Self {
        Self { method }
    }
}

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        if self.method == Method::GET {
            tracing::debug!("Redirecting to {}", FL_REDIRECT_ANON.as_str());
            Redirect::temporary(FL_REDIRECT_ANON.as_str()).into_response()
        } else {
            tracing::debug!("Unauthorized");
            (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
        }
    }
}

/// The logged-in user, available as an axum extractor
///
/// Looks first for a user the callback middleware logged in during this very
/// request, then for the session cookie. Rejects GET requests with a redirect
/// to the login route and everything else with 401.
///
/// ```no_run
/// use axum::{Router, routing::get};
/// use federated_login_axum::{AuthUser, FederatedLogin};
///
/// async fn protected(user: AuthUser) -> String {
///     format!("Hello, {}!", user.label)
/// }
///
/// fn app(state: FederatedLogin) -> Router {
///     Router::new().route("/protected", get(protected)).with_state(state)
/// }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
    /// Display name
    pub label: String,
}

impl From<SessionUser> for AuthUser {
    fn from(user: SessionUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            label: user.label,
        }
    }
}

impl From<&LocalUser> for AuthUser {
    fn from(user: &LocalUser) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            label: user.label.clone(),
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    FederatedLogin: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let federated = FederatedLogin::from_ref(state);
        match federated
            .login()
            .sessions()
            .get_user_from_session(&parts.headers)
            .await
        {
            Ok(Some(user)) => Ok(AuthUser::from(user)),
            Ok(None) => {
                tracing::debug!("No valid session on request");
                Err(AuthRedirect::new(parts.method.clone()))
            }
            Err(e) => {
                tracing::error!("Failed to read session: {}", e);
                Err(AuthRedirect::new(parts.method.clone()))
            }
        }
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    FederatedLogin: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        let result: Result<Self, Self::Rejection> =
            <AuthUser as FromRequestParts<S>>::from_request_parts(parts, state).await;
        Ok(result.ok())
    }
}
