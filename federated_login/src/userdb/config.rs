use std::env;
use std::sync::Arc;

use crate::userdb::errors::UserError;
use crate::userdb::memory::InMemoryUserDirectory;
use crate::userdb::sqlite::SqliteUserDirectory;
use crate::userdb::types::UserDirectory;

/// Build the user directory selected by `USER_DIRECTORY_TYPE`
///
/// `memory` (the default) or `sqlite`, which reads its connection string from
/// `USER_DIRECTORY_URL`.
pub async fn user_directory_from_env() -> Result<Arc<dyn UserDirectory>, UserError> {
    let directory_type = env::var("USER_DIRECTORY_TYPE").unwrap_or_else(|_| "memory".to_string());
    let directory_url = env::var("USER_DIRECTORY_URL").ok();
    build_user_directory(&directory_type, directory_url.as_deref()).await
}

async fn build_user_directory(
    directory_type: &str,
    url: Option<&str>,
) -> Result<Arc<dyn UserDirectory>, UserError> {
    tracing::info!("Initializing user directory with type: {}", directory_type);
    match directory_type {
        "memory" => Ok(Arc::new(InMemoryUserDirectory::new())),
        "sqlite" => {
            let url = url.ok_or_else(|| {
                UserError::Storage("USER_DIRECTORY_URL must be set for sqlite".to_string())
            })?;
            Ok(Arc::new(SqliteUserDirectory::connect(url).await?))
        }
        other => Err(UserError::UnsupportedType(other.to_string())),
    }
}
