use std::sync::Arc;

use federated_login::{LoginService, ProviderConfig};

/// Shared state for the middleware, the routes and the [`AuthUser`](crate::AuthUser) extractor
///
/// Cheap to clone. Applications with their own state type implement
/// `FromRef<AppState> for FederatedLogin`.
#[derive(Clone)]
pub struct FederatedLogin {
    login: Arc<LoginService>,
    provider: Arc<ProviderConfig>,
}

impl FederatedLogin {
    pub fn new(login: LoginService, provider: ProviderConfig) -> Self {
        Self {
            login: Arc::new(login),
            provider: Arc::new(provider),
        }
    }

    /// Read the provider and every collaborator from the environment
    pub async fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let provider = ProviderConfig::from_env()?;
        let login = federated_login::init(provider.clone()).await?;
        Ok(Self::new(login, provider))
    }

    pub fn login(&self) -> &LoginService {
        &self.login
    }

    pub fn provider(&self) -> &ProviderConfig {
        &self.provider
    }
}
