use crate::config::LoginConfig;
use crate::coordination::errors::LoginError;
use crate::oauth2::Claims;
use crate::userdb::{LocalUser, NewUser, UserDirectory};

/// How the local account was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// The username claim matched a username exactly
    Exact,
    /// The part of an email-shaped username before the first `@` matched
    LocalPart,
    /// No match; the account was provisioned from the claims
    Created,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedUser {
    pub user: LocalUser,
    /// The name the session is established under. For a local-part match this
    /// is the derived name, not the full claim value.
    pub username: String,
    pub matched_by: MatchKind,
}

/// The text before the first `@`, or `None` when there is no `@` at all
///
/// `"@example.com"` yields `Some("")`.
pub fn email_local_part(username: &str) -> Option<&str> {
    username.split_once('@').map(|(local, _)| local)
}

/// Map an identity token's claims to a local account
///
/// Tries an exact username match, then the email local part, then creates
/// the account if `create_new_user` is on. At most one account is created,
/// and only when neither lookup found one.
pub async fn resolve_user(
    config: &LoginConfig,
    claims: &Claims,
    users: &dyn UserDirectory,
) -> Result<ResolvedUser, LoginError> {
    let username = username_from_claims(&config.username_attribute, claims)?;

    if let Some(user) = find(users, &username).await? {
        return Ok(ResolvedUser {
            user,
            username,
            matched_by: MatchKind::Exact,
        });
    }

    if let Some(local_part) = email_local_part(&username) {
        if let Some(user) = find(users, local_part).await? {
            tracing::debug!(
                "No user {:?}; matched local part {:?} instead",
                username,
                local_part
            );
            return Ok(ResolvedUser {
                user,
                username: local_part.to_string(),
                matched_by: MatchKind::LocalPart,
            });
        }
    }

    if !config.create_new_user {
        return Err(LoginError::UserCreationDisabled(username));
    }

    let user = users
        .create_user(NewUser::from_claims(&username, claims))
        .await
        .map_err(LoginError::UserCreationFailed)?;
    tracing::info!("Provisioned local user {:?} on first login", user.username);

    Ok(ResolvedUser {
        username: user.username.clone(),
        user,
        matched_by: MatchKind::Created,
    })
}

/// Presence is decided by claim name. A claim that exists but holds null, an
/// array, an object or an empty string cannot name a user and counts as absent.
fn username_from_claims(attribute: &str, claims: &Claims) -> Result<String, LoginError> {
    if !claims.contains(attribute) {
        return Err(LoginError::ClaimMissing(attribute.to_string()));
    }
    claims
        .get_string(attribute)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| LoginError::ClaimMissing(attribute.to_string()))
}

async fn find(users: &dyn UserDirectory, username: &str) -> Result<Option<LocalUser>, LoginError> {
    users
        .find_user_by_username(username)
        .await
        .map_err(LoginError::UserLookupFailed)
}
