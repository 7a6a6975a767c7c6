use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::oauth2::Claims;
use crate::userdb::errors::UserError;

/// An account in the host's user directory
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct LocalUser {
    /// Unique user identifier
    pub id: String,
    /// Login name; unique within the directory
    pub username: String,
    pub email: Option<String>,
    /// Display name
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user to be provisioned on first federated login
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub label: String,
}

impl NewUser {
    /// Build the account details from the identity token's claims
    ///
    /// `username` is the value already taken from the username claim. The
    /// display label comes from `name` and falls back to the username.
    pub fn from_claims(username: &str, claims: &Claims) -> Self {
        let label = claims
            .get_string("name")
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| username.to_string());
        Self {
            username: username.to_string(),
            email: claims.get_string("email"),
            label,
        }
    }

    pub(super) fn into_local_user(self) -> LocalUser {
        let now = Utc::now();
        LocalUser {
            id: uuid::Uuid::new_v4().to_string(),
            username: self.username,
            email: self.email,
            label: self.label,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The host's user directory as seen by the login pipeline
///
/// Lookups are exact-string; any case folding is the directory's business.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<LocalUser>, UserError>;

    /// Create `user`, or return the existing account if the username was
    /// taken in the meantime.
    async fn create_user(&self, user: NewUser) -> Result<LocalUser, UserError>;
}
