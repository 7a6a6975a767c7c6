use std::env;

use crate::config::ConfigError;

const DEFAULT_COOKIE_NAME: &str = "__Host-SessionId";
const DEFAULT_MAX_AGE: u64 = 600;
/// One year
const MAX_MAX_AGE: u64 = 365 * 24 * 60 * 60;

/// Session cookie settings
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Lifetime of both the cookie and the stored session, in seconds
    pub max_age: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            max_age: DEFAULT_MAX_AGE,
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cookie_name =
            lookup("SESSION_COOKIE_NAME").unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string());
        if cookie_name.is_empty() || cookie_name.contains([';', '=', ' ']) {
            return Err(ConfigError::Invalid(
                "SESSION_COOKIE_NAME".to_string(),
                cookie_name,
            ));
        }

        let max_age = match lookup("SESSION_COOKIE_MAX_AGE") {
            None => DEFAULT_MAX_AGE,
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 && secs <= MAX_MAX_AGE => secs,
                _ => {
                    return Err(ConfigError::Invalid(
                        "SESSION_COOKIE_MAX_AGE".to_string(),
                        raw,
                    ));
                }
            },
        };

        Ok(Self {
            cookie_name,
            max_age,
        })
    }
}
