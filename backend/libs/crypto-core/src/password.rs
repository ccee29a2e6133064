/// Password hashing and verification using Argon2id
///
/// The work factor is fixed per process: every hash is produced with the
/// memory cost, iteration count and parallelism given at construction.
/// Verification reads the parameters back out of the stored PHC string, so
/// hashes written under an older work factor keep verifying.
use crate::{CryptoError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHashConfig {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism (lanes)
    pub parallelism: u32,
}

impl Default for PasswordHashConfig {
    /// OWASP baseline for Argon2id: 19 MiB, 2 passes, 1 lane
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params = self.argon2.params();
        f.debug_struct("PasswordHasher")
            .field("memory_kib", &params.m_cost())
            .field("iterations", &params.t_cost())
            .field("parallelism", &params.p_cost())
            .finish()
    }
}

impl PasswordHasher {
    /// Build a hasher with a fixed work factor
    ///
    /// ## Errors
    ///
    /// Returns `CryptoError::Config` if the parameters are outside what
    /// Argon2 accepts (e.g. memory below 8 KiB per lane).
    pub fn new(config: PasswordHashConfig) -> Result<Self> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| CryptoError::Config(format!("invalid Argon2 parameters: {e}")))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a plaintext password into a PHC-formatted string
    ///
    /// A fresh random salt is generated per call, so hashing the same
    /// password twice yields different strings.
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| CryptoError::Hash(e.to_string()))?
            .to_string();

        Ok(hash)
    }

    /// Verify a password against a stored PHC hash
    ///
    /// Returns `Ok(false)` on mismatch. Errors only when the stored hash
    /// cannot be parsed or verification itself fails.
    pub fn verify(&self, password: &str, password_hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(password_hash)
            .map_err(|e| CryptoError::MalformedHash(e.to_string()))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(CryptoError::Hash(e.to_string())),
        }
    }
}
