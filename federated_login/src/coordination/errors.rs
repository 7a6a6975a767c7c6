use thiserror::Error;

use crate::oauth2::OAuth2Error;
use crate::session::SessionError;
use crate::userdb::UserError;

/// Why a login attempt stopped
///
/// None of these reach the browser. A request whose login attempt aborts is
/// served exactly as if no attempt had been made.
#[derive(Error, Debug, Clone)]
pub enum LoginError {
    /// No authorization code on the request; it has nothing to do with login
    #[error("Request carries no authorization code")]
    NotApplicable,

    /// The callback already ran for this request
    #[error("Login callback already handled for this request")]
    AlreadyHandled,

    #[error("A session already exists for this request")]
    AlreadyAuthenticated,

    /// The session store could not tell whether the request is logged in
    #[error("Session check failed: {0}")]
    SessionCheckFailed(SessionError),

    #[error("Token exchange failed: {0}")]
    ExchangeFailed(OAuth2Error),

    #[error("Identity token rejected: {0}")]
    InvalidIdToken(OAuth2Error),

    /// The configured username claim is absent (or holds no usable value)
    #[error("Identity token has no usable '{0}' claim")]
    ClaimMissing(String),

    #[error("User lookup failed: {0}")]
    UserLookupFailed(UserError),

    #[error("No local user '{0}' and user creation is disabled")]
    UserCreationDisabled(String),

    #[error("User creation failed: {0}")]
    UserCreationFailed(UserError),

    #[error("Session could not be established: {0}")]
    SessionEstablishFailed(SessionError),
}

impl LoginError {
    /// Log the error at a level matching its severity and return self
    ///
    /// Requests without a code are the common case and stay at trace level.
    pub fn log(self) -> Self {
        match &self {
            Self::NotApplicable | Self::AlreadyHandled => tracing::trace!("{}", self),
            Self::AlreadyAuthenticated => tracing::debug!("{}", self),
            Self::ClaimMissing(_) | Self::UserCreationDisabled(_) => tracing::warn!("{}", self),
            Self::SessionCheckFailed(_)
            | Self::ExchangeFailed(_)
            | Self::InvalidIdToken(_)
            | Self::UserLookupFailed(_)
            | Self::UserCreationFailed(_)
            | Self::SessionEstablishFailed(_) => tracing::error!("{}", self),
        }
        self
    }

    /// Whether the request was a login attempt at all
    pub fn is_login_attempt(&self) -> bool {
        !matches!(
            self,
            Self::NotApplicable | Self::AlreadyHandled | Self::AlreadyAuthenticated
        )
    }
}
