use async_graphql::ErrorExtensions;
use crypto_core::CryptoError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Only the user who posted a link can change it")]
    Forbidden,

    #[error("User not found")]
    UserNotFound,

    #[error("Incorrect password")]
    InvalidCredentials,

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Stable machine-readable code carried in `extensions.code`
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated => "UNAUTHENTICATED",
            ApiError::Forbidden => "FORBIDDEN",
            ApiError::UserNotFound => "NOT_FOUND",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::DuplicateEmail => "DUPLICATE_EMAIL",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Store(_) => "STORE_ERROR",
            ApiError::Internal(_) => "INTERNAL",
        }
    }

    /// Message sent to clients
    ///
    /// Store and internal failures are logged where they happen and
    /// reported generically.
    fn public_message(&self) -> String {
        match self {
            ApiError::Store(_) => "Store error".to_string(),
            ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> async_graphql::Error {
        let code = self.code();
        async_graphql::Error::new(self.public_message()).extend_with(|_, ext| ext.set("code", code))
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {}", err);
        ApiError::Store(err.to_string())
    }
}

impl From<CryptoError> for ApiError {
    fn from(err: CryptoError) -> Self {
        tracing::error!("Credential error: {}", err);
        ApiError::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        tracing::error!("Blocking task failed: {}", err);
        ApiError::Internal(err.to_string())
    }
}
