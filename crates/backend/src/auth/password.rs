//! Credential hashing with Argon2id.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordVerifier, Version};
use thiserror::Error;

const DECOY_PASSWORD: &str = "decoy-credential";

#[derive(Debug, Error)]
pub enum HashError {
    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("password does not match")]
    Mismatch,

    #[error("stored password hash is malformed")]
    MalformedHash,
}

/// Argon2 work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasherConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Hashes and verifies passwords.
///
/// Output is a PHC string carrying algorithm, parameters and salt, so
/// verification only needs the stored hash even after the work factor
/// changes.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    decoy_hash: String,
}

impl CredentialHasher {
    pub fn new(config: HasherConfig) -> Result<Self, HashError> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| HashError::Hashing(e.to_string()))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let decoy_hash = hash_with(&argon2, DECOY_PASSWORD)?;

        Ok(Self { argon2, decoy_hash })
    }

    pub fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        hash_with(&self.argon2, plaintext)
    }

    /// Runs a full verification against a throwaway hash made with this
    /// hasher's work factor.
    ///
    /// Sign-in calls this when there is no account to check, so the reply
    /// takes as long as a wrong password does. The result is always an error.
    pub fn verify_decoy(&self, candidate: &str) -> Result<(), HashError> {
        match self.verify(&self.decoy_hash, candidate) {
            Ok(()) => Err(HashError::Mismatch),
            Err(e) => Err(e),
        }
    }

    /// Checks `candidate` against a stored PHC string.
    pub fn verify(&self, stored_hash: &str, candidate: &str) -> Result<(), HashError> {
        let parsed = PasswordHash::new(stored_hash).map_err(|_| HashError::MalformedHash)?;

        self.argon2
            .verify_password(candidate.as_bytes(), &parsed)
            .map_err(|e| match e {
                argon2::password_hash::Error::Password => HashError::Mismatch,
                other => HashError::Hashing(other.to_string()),
            })
    }
}

fn hash_with(argon2: &Argon2<'_>, plaintext: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| HashError::Hashing(e.to_string()))
}
