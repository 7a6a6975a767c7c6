use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};

use crate::userdb::errors::UserError;
use crate::userdb::types::{LocalUser, NewUser, UserDirectory};

const USERS_TABLE: &str = "federated_users";

/// User directory stored in a SQLite database
#[derive(Debug, Clone)]
pub struct SqliteUserDirectory {
    pool: Pool<Sqlite>,
}

impl SqliteUserDirectory {
    /// Connect to `url` and make sure the users table exists
    pub async fn connect(url: &str) -> Result<Self, UserError> {
        // A single connection keeps `sqlite::memory:` databases shared
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Self::new(pool).await
    }

    pub async fn new(pool: Pool<Sqlite>) -> Result<Self, UserError> {
        let directory = Self { pool };
        directory.create_tables().await?;
        Ok(directory)
    }

    async fn create_tables(&self) -> Result<(), UserError> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {USERS_TABLE} (
                id TEXT PRIMARY KEY NOT NULL,
                username TEXT NOT NULL UNIQUE,
                email TEXT,
                label TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            )
            "#
        ))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for SqliteUserDirectory {
    #[tracing::instrument(skip(self))]
    async fn find_user_by_username(&self, username: &str) -> Result<Option<LocalUser>, UserError> {
        let user = sqlx::query_as::<_, LocalUser>(&format!(
            r#"
            SELECT id, username, email, label, created_at, updated_at
            FROM {USERS_TABLE} WHERE username = ?
            "#
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    #[tracing::instrument(skip(self, user), fields(username = %user.username))]
    async fn create_user(&self, user: NewUser) -> Result<LocalUser, UserError> {
        if user.username.is_empty() {
            return Err(UserError::InvalidData(
                "username must not be empty".to_string(),
            ));
        }

        let username = user.username.clone();
        let candidate = user.into_local_user();

        // A concurrent login for the same username may insert first
        let result = sqlx::query(&format!(
            r#"
            INSERT INTO {USERS_TABLE} (id, username, email, label, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (username) DO NOTHING
            "#
        ))
        .bind(&candidate.id)
        .bind(&candidate.username)
        .bind(&candidate.email)
        .bind(&candidate.label)
        .bind(candidate.created_at)
        .bind(candidate.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!("User already existed, returning stored record");
        }

        self.find_user_by_username(&username)
            .await?
            .ok_or_else(|| UserError::Storage(format!("user {username} missing after insert")))
    }
}
