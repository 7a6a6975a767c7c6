use http::StatusCode;

use federated_login::{OAuth2Error, SessionError};

/// Helper trait for converting errors to a standard response error format
pub trait IntoResponseError<T> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)>;
}

impl<T> IntoResponseError<T> for Result<T, SessionError> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| {
            tracing::error!("Session error: {}", e);
            let status = match e {
                SessionError::InvalidData(_) => StatusCode::BAD_REQUEST,
                SessionError::Storage(_) | SessionError::Utils(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            (status, e.to_string())
        })
    }
}

impl<T> IntoResponseError<T> for Result<T, OAuth2Error> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| {
            tracing::error!("OAuth2 error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })
    }
}
