//! Central configuration for the federated_login crate
//!
//! Everything here is read from the environment once, at startup, and then
//! handed to the pipeline by value. Nothing in the login path reads the
//! environment on its own.

use std::env;
use std::sync::LazyLock;

use thiserror::Error;

/// Route prefix for the login and logout endpoints exposed by the axum crate
///
/// Default: "/auth"
pub static FL_ROUTE_PREFIX: LazyLock<String> =
    LazyLock::new(|| env::var("FL_ROUTE_PREFIX").unwrap_or_else(|_| "/auth".to_string()));

const DEFAULT_USERNAME_ATTRIBUTE: &str = "cognito:username";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(String),

    #[error("Invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// Options consulted by the login pipeline
///
/// `create_new_user` and `disable_wp_login` are only switched on by the literal
/// string `"true"`; every other value, including `"TRUE"` and `"1"`, leaves
/// them off.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginConfig {
    /// Claim whose value is used as the local username
    pub username_attribute: String,
    /// Provision a local account when no existing user matches
    pub create_new_user: bool,
    /// Post-login redirect target; empty means "no redirect"
    pub homepage: String,
    /// Suppress the host's native username/password login form
    pub disable_wp_login: bool,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            username_attribute: DEFAULT_USERNAME_ATTRIBUTE.to_string(),
            create_new_user: false,
            homepage: String::new(),
            disable_wp_login: false,
        }
    }
}

impl LoginConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    ///
    /// Used by `from_env`, and by hosts that keep these settings somewhere
    /// other than the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username_attribute = lookup("OIDC_USERNAME_ATTRIBUTE")
            .unwrap_or_else(|| DEFAULT_USERNAME_ATTRIBUTE.to_string());
        if username_attribute.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "OIDC_USERNAME_ATTRIBUTE".to_string(),
                "must not be empty".to_string(),
            ));
        }

        // The homepage ends up in a `Location` header after the session exists
        let homepage = lookup("OIDC_HOMEPAGE").unwrap_or_default();
        if http::HeaderValue::from_str(&homepage).is_err() {
            return Err(ConfigError::Invalid(
                "OIDC_HOMEPAGE".to_string(),
                "not usable as a redirect location".to_string(),
            ));
        }

        Ok(Self {
            username_attribute,
            create_new_user: parse_flag(lookup("OIDC_CREATE_NEW_USER").as_deref()),
            homepage,
            disable_wp_login: parse_flag(lookup("OIDC_DISABLE_WP_LOGIN").as_deref()),
        })
    }

    /// The configured post-login destination, if any
    pub fn redirect_target(&self) -> Option<&str> {
        if self.homepage.is_empty() {
            None
        } else {
            Some(self.homepage.as_str())
        }
    }

    pub fn native_login_enabled(&self) -> bool {
        !self.disable_wp_login
    }
}

pub(crate) fn parse_flag(value: Option<&str>) -> bool {
    value == Some("true")
}

/// Read a required setting through `lookup`, treating blank values as missing
pub(crate) fn required<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(key.to_string())),
    }
}
