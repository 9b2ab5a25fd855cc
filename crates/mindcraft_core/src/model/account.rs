//! Account identity model.
//!
//! # Invariants
//! - `username` is non-empty after trimming and unique across the store.
//! - `password_hash` is an opaque one-way hash, never plaintext.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned account identifier (`accounts.id`).
pub type AccountId = i64;

/// Persisted account identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    /// PHC-formatted credential hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// Insert shape for an account; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Validation errors for account and game-state records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    EmptyUsername,
    EmptyEmail,
    EmptyPasswordHash,
    /// A counter that must start at 1 was zero.
    ZeroOrdinal(&'static str),
    EmptyItemName,
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username cannot be empty"),
            Self::EmptyEmail => write!(f, "email cannot be empty"),
            Self::EmptyPasswordHash => write!(f, "password hash cannot be empty"),
            Self::ZeroOrdinal(field) => write!(f, "{field} must be at least 1"),
            Self::EmptyItemName => write!(f, "item names cannot be empty"),
        }
    }
}

impl Error for ModelValidationError {}

impl NewAccount {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
        }
    }

    /// Checks field-level invariants before persistence.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.username.trim().is_empty() {
            return Err(ModelValidationError::EmptyUsername);
        }
        if self.email.trim().is_empty() {
            return Err(ModelValidationError::EmptyEmail);
        }
        if self.password_hash.is_empty() {
            return Err(ModelValidationError::EmptyPasswordHash);
        }
        Ok(())
    }
}
