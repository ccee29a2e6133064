/// Bearer token issuance and verification
///
/// Tokens are HS256 JWTs signed with a server-held secret. The secret is
/// handed to `TokenService::new` once at startup and owned by the service
/// value; there is no process-global key state.
///
/// ## Claims
///
/// - `userId`: numeric id of the authenticated user
/// - `iat`: issued-at (Unix seconds)
/// - `exp`: only present when an expiry is configured
///
/// Without a configured expiry, tokens stay valid for as long as the
/// secret does.
use crate::{CryptoError, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: i32,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry_seconds: Option<i64>,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &"[REDACTED]")
            .field("expiry_seconds", &self.expiry_seconds)
            .finish()
    }
}

impl TokenService {
    /// Create a token service from the shared secret
    ///
    /// `expiry_seconds` of `None` (or zero) issues non-expiring tokens.
    ///
    /// ## Errors
    ///
    /// Returns `CryptoError::Config` if the secret is empty.
    pub fn new(secret: &str, expiry_seconds: Option<u64>) -> Result<Self> {
        if secret.is_empty() {
            return Err(CryptoError::Config("token secret must not be empty".to_string()));
        }

        let expiry_seconds = expiry_seconds
            .filter(|secs| *secs > 0)
            .map(|secs| i64::try_from(secs).unwrap_or(i64::MAX));

        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.required_spec_claims.clear();
        validation.validate_exp = expiry_seconds.is_some();
        if validation.validate_exp {
            validation.required_spec_claims.insert("exp".to_string());
        } else {
            tracing::debug!("Token expiry disabled; issued tokens do not expire");
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry_seconds,
        })
    }

    /// Issue a signed token for `user_id`
    pub fn issue(&self, user_id: i32) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id,
            iat: now,
            exp: self.expiry_seconds.map(|secs| now.saturating_add(secs)),
        };

        let token = encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Verify a token's signature (and expiry, when configured) and return its claims
    ///
    /// `token` must not carry the `Bearer ` prefix.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }

    pub fn expiry_seconds(&self) -> Option<i64> {
        self.expiry_seconds
    }
}
