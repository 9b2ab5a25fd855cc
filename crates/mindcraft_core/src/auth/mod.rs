//! Credential hashing.
//!
//! # Responsibility
//! - Turn plaintext passwords into opaque one-way hashes for storage.
//! - Verify plaintext candidates against stored hashes.

pub mod password;
