//! Password hashing contract and Argon2id implementation.
//!
//! # Invariants
//! - Hashes are PHC strings carrying their own salt and parameters.
//! - A hash never contains or equals the plaintext it was derived from.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum CredentialError {
    /// Hashing backend rejected the input or parameters.
    Hash(String),
    /// Stored hash is not a parseable PHC string.
    MalformedHash(String),
}

impl Display for CredentialError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hash(message) => write!(f, "failed to hash password: {message}"),
            Self::MalformedHash(message) => write!(f, "invalid password hash format: {message}"),
        }
    }
}

impl Error for CredentialError {}

/// One-way password hashing used when creating accounts.
pub trait CredentialHasher {
    fn hash(&self, plaintext: &str) -> Result<String, CredentialError>;

    /// Returns `Ok(false)` on a mismatch and `Err` only for unusable hashes.
    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, CredentialError>;
}

impl<H: CredentialHasher + ?Sized> CredentialHasher for &H {
    fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
        (**self).hash(plaintext)
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, CredentialError> {
        (**self).verify(plaintext, hash)
    }
}

/// Argon2id hasher with the crate's default cost parameters.
#[derive(Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|err| CredentialError::Hash(err.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, CredentialError> {
        let parsed =
            PasswordHash::new(hash).map_err(|err| CredentialError::MalformedHash(err.to_string()))?;

        match self.argon2.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(err) => Err(CredentialError::MalformedHash(err.to_string())),
        }
    }
}
