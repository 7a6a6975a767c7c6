use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::errors::SessionError;
use crate::storage::CacheData;
use crate::userdb::LocalUser;

/// The logged-in user as recorded in the session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionUser {
    pub id: String,
    pub username: String,
    pub label: String,
}

impl From<&LocalUser> for SessionUser {
    fn from(user: &LocalUser) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            label: user.label.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct StoredSession {
    pub(super) user: SessionUser,
    pub(super) expires_at: DateTime<Utc>,
    pub(super) ttl: u64,
}

impl TryFrom<StoredSession> for CacheData {
    type Error = SessionError;

    fn try_from(data: StoredSession) -> Result<Self, Self::Error> {
        let value =
            serde_json::to_string(&data).map_err(|e| SessionError::InvalidData(e.to_string()))?;
        Ok(Self { value })
    }
}

impl TryFrom<CacheData> for StoredSession {
    type Error = SessionError;

    fn try_from(data: CacheData) -> Result<Self, Self::Error> {
        serde_json::from_str(&data.value).map_err(|e| SessionError::InvalidData(e.to_string()))
    }
}
