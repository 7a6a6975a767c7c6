use std::env;

use crate::storage::errors::StorageError;

use super::types::{CacheStore, InMemoryCacheStore, RedisCacheStore};

/// Build the cache store selected by `GENERIC_CACHE_STORE_TYPE`
///
/// `memory` (the default) needs no URL; `redis` reads `GENERIC_CACHE_STORE_URL`
/// and checks the connection before returning.
pub async fn cache_store_from_env() -> Result<Box<dyn CacheStore>, StorageError> {
    let store_type = env::var("GENERIC_CACHE_STORE_TYPE").unwrap_or_else(|_| "memory".to_string());
    let store_url = env::var("GENERIC_CACHE_STORE_URL").ok();
    build_cache_store(&store_type, store_url.as_deref()).await
}

pub(super) async fn build_cache_store(
    store_type: &str,
    store_url: Option<&str>,
) -> Result<Box<dyn CacheStore>, StorageError> {
    tracing::info!("Initializing cache store with type: {}", store_type);

    let store: Box<dyn CacheStore> = match store_type {
        "memory" => Box::new(InMemoryCacheStore::new()),
        "redis" => {
            let url = store_url.ok_or_else(|| {
                StorageError::Storage("GENERIC_CACHE_STORE_URL must be set for redis".to_string())
            })?;
            Box::new(RedisCacheStore::new(url)?)
        }
        other => return Err(StorageError::UnsupportedType(other.to_string())),
    };

    store.init().await?;
    tracing::info!("Connected to cache store: type={}", store_type);
    Ok(store)
}
