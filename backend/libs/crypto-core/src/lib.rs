//! Credential primitives shared by the linkfeed services
//!
//! - `password`: Argon2id hashing with a fixed work factor
//! - `jwt`: HS256 bearer token issuance and verification

pub mod jwt;
pub mod password;

pub use jwt::{Claims, TokenService};
pub use password::{PasswordHashConfig, PasswordHasher};

pub type Result<T> = std::result::Result<T, CryptoError>;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}
