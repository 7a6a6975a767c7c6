use thiserror::Error;

#[derive(Clone, Error, Debug)]
pub enum UserError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unsupported user directory type: {0}")]
    UnsupportedType(String),
}

impl From<sqlx::Error> for UserError {
    fn from(err: sqlx::Error) -> Self {
        UserError::Storage(err.to_string())
    }
}
