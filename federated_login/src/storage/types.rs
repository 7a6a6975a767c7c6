use serde::{Deserialize, Serialize};

/// Data stored in the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheData {
    pub value: String,
}
