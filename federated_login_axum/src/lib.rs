//! federated_login_axum - axum integration for the federated-login pipeline
//!
//! Wrap the application in [`federated_login_callback`] so every request is
//! checked for a provider redirect, mount [`federated_login_router`] under
//! [`FL_ROUTE_PREFIX`] for the login and logout links, and use [`AuthUser`]
//! in handlers that need the logged-in user.

mod config;
mod error;
mod middleware;
mod router;
mod session;
mod state;

#[cfg(test)]
mod test_utils;

pub use config::FL_REDIRECT_AFTER_LOGOUT;
pub use error::IntoResponseError;
pub use middleware::{federated_login_callback, native_login_guard};
pub use router::federated_login_router;
pub use session::{AuthRedirect, AuthUser};
pub use state::FederatedLogin;

// Re-export the route prefix and the core configuration types
pub use federated_login::{FL_ROUTE_PREFIX, LoginConfig, ProviderConfig};
