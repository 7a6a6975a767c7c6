use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::userdb::errors::UserError;
use crate::userdb::types::{LocalUser, NewUser, UserDirectory};

/// User directory held in process memory, keyed by username
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: Mutex<HashMap<String, LocalUser>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        tracing::info!("Creating new in-memory user directory");
        Self::default()
    }

    /// Seed the directory with existing accounts
    pub fn with_users(users: impl IntoIterator<Item = LocalUser>) -> Self {
        let users = users
            .into_iter()
            .map(|user| (user.username.clone(), user))
            .collect();
        Self {
            users: Mutex::new(users),
        }
    }

    pub async fn len(&self) -> usize {
        self.users.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.lock().await.is_empty()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<LocalUser>, UserError> {
        Ok(self.users.lock().await.get(username).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<LocalUser, UserError> {
        if user.username.is_empty() {
            return Err(UserError::InvalidData(
                "username must not be empty".to_string(),
            ));
        }

        let mut users = self.users.lock().await;
        let created = users
            .entry(user.username.clone())
            .or_insert_with(|| user.into_local_user());
        Ok(created.clone())
    }
}
