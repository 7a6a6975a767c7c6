use std::collections::HashMap;
use std::sync::Arc;

use http::HeaderMap;

use crate::config::LoginConfig;
use crate::coordination::errors::LoginError;
use crate::coordination::resolver::{MatchKind, resolve_user};
use crate::oauth2::{IdTokenVerifier, TokenClient, extract_authorization_code};
use crate::session::SessionManager;
use crate::userdb::{LocalUser, UserDirectory};

/// How far a login attempt got. Stages only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LoginStage {
    Idle,
    CodeFound,
    TokenExchanged,
    ClaimsParsed,
    UserResolved,
    SessionEstablished,
    Redirected,
}

/// Request-scoped "already handled" flag
///
/// Keep one per incoming request and hand the same gate to every call; only
/// the first call runs the pipeline.
#[derive(Debug, Clone, Default)]
pub struct CallbackGate {
    handled: bool,
}

impl CallbackGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_handled(&self) -> bool {
        self.handled
    }

    /// Mark the gate as handled; `false` if it already was
    fn enter(&mut self) -> bool {
        !std::mem::replace(&mut self.handled, true)
    }
}

#[derive(Debug, Clone)]
pub struct LoginSuccess {
    pub user: LocalUser,
    /// Name the session was established under
    pub username: String,
    pub matched_by: MatchKind,
    /// Headers (`Set-Cookie`) that carry the new session to the browser
    pub headers: HeaderMap,
    /// Where to send the browser, when a homepage is configured
    pub redirect_to: Option<String>,
}

impl LoginSuccess {
    pub fn stage(&self) -> LoginStage {
        if self.redirect_to.is_some() {
            LoginStage::Redirected
        } else {
            LoginStage::SessionEstablished
        }
    }
}

#[derive(Debug, Clone)]
pub enum LoginOutcome {
    /// The pipeline stopped after reaching `stage`; the request proceeds as if
    /// nothing happened
    Aborted {
        stage: LoginStage,
        reason: LoginError,
    },
    Completed(LoginSuccess),
}

impl LoginOutcome {
    pub fn stage(&self) -> LoginStage {
        match self {
            Self::Aborted { stage, .. } => *stage,
            Self::Completed(success) => success.stage(),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn success(&self) -> Option<&LoginSuccess> {
        match self {
            Self::Completed(success) => Some(success),
            Self::Aborted { .. } => None,
        }
    }

    pub fn redirect_to(&self) -> Option<&str> {
        self.success()?.redirect_to.as_deref()
    }
}

/// Turns an authorization-code callback into a local session
///
/// Holds no per-request state; configuration and collaborators are injected
/// once and shared by every request.
pub struct LoginService {
    config: LoginConfig,
    tokens: Arc<dyn TokenClient>,
    verifier: Arc<IdTokenVerifier>,
    users: Arc<dyn UserDirectory>,
    sessions: Arc<dyn SessionManager>,
}

impl LoginService {
    pub fn new(
        config: LoginConfig,
        tokens: Arc<dyn TokenClient>,
        verifier: Arc<IdTokenVerifier>,
        users: Arc<dyn UserDirectory>,
        sessions: Arc<dyn SessionManager>,
    ) -> Self {
        Self {
            config,
            tokens,
            verifier,
            users,
            sessions,
        }
    }

    pub fn config(&self) -> &LoginConfig {
        &self.config
    }

    pub fn sessions(&self) -> &Arc<dyn SessionManager> {
        &self.sessions
    }

    /// Run the callback pipeline for one request
    ///
    /// Never fails: every problem ends in [`LoginOutcome::Aborted`] after being
    /// logged.
    pub async fn handle_request(
        &self,
        params: &HashMap<String, String>,
        headers: &HeaderMap,
        gate: &mut CallbackGate,
    ) -> LoginOutcome {
        let mut stage = LoginStage::Idle;
        match self.run(params, headers, gate, &mut stage).await {
            Ok(success) => {
                tracing::info!(
                    username = %success.username,
                    matched_by = ?success.matched_by,
                    redirect = success.redirect_to.is_some(),
                    "Federated login completed"
                );
                LoginOutcome::Completed(success)
            }
            Err(reason) => LoginOutcome::Aborted {
                stage,
                reason: reason.log(),
            },
        }
    }

    async fn run(
        &self,
        params: &HashMap<String, String>,
        headers: &HeaderMap,
        gate: &mut CallbackGate,
        stage: &mut LoginStage,
    ) -> Result<LoginSuccess, LoginError> {
        if !gate.enter() {
            return Err(LoginError::AlreadyHandled);
        }

        let code = extract_authorization_code(params).ok_or(LoginError::NotApplicable)?;
        advance(stage, LoginStage::CodeFound);

        let logged_in = self
            .sessions
            .is_logged_in(headers)
            .await
            .map_err(LoginError::SessionCheckFailed)?;
        if logged_in {
            return Err(LoginError::AlreadyAuthenticated);
        }

        let token_response = self
            .tokens
            .exchange_code(code)
            .await
            .map_err(LoginError::ExchangeFailed)?;
        advance(stage, LoginStage::TokenExchanged);

        let claims = self
            .verifier
            .parse(&token_response.id_token)
            .await
            .map_err(LoginError::InvalidIdToken)?;
        advance(stage, LoginStage::ClaimsParsed);

        let resolved = resolve_user(&self.config, &claims, self.users.as_ref()).await?;
        advance(stage, LoginStage::UserResolved);

        let session_headers = self
            .sessions
            .log_in(&resolved.user)
            .await
            .map_err(LoginError::SessionEstablishFailed)?;
        advance(stage, LoginStage::SessionEstablished);

        let redirect_to = self.config.redirect_target().map(str::to_string);
        if redirect_to.is_some() {
            advance(stage, LoginStage::Redirected);
        }

        Ok(LoginSuccess {
            user: resolved.user,
            username: resolved.username,
            matched_by: resolved.matched_by,
            headers: session_headers,
            redirect_to,
        })
    }
}

fn advance(stage: &mut LoginStage, next: LoginStage) {
    debug_assert!(next > *stage);
    tracing::debug!("Login stage {:?} -> {:?}", stage, next);
    *stage = next;
}
