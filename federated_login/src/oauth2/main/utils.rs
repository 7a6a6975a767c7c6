use std::time::Duration;

use crate::oauth2::errors::OAuth2Error;

pub(super) fn build_client(timeout: Duration) -> Result<reqwest::Client, OAuth2Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .map_err(|e| OAuth2Error::TokenExchange(format!("failed to build HTTP client: {e}")))
}
