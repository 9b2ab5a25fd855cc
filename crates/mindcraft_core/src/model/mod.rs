//! Player account domain model.
//!
//! # Responsibility
//! - Define the account identity record and its two one-to-one dependents.
//! - Keep structured game state typed; encoding happens in the repository.
//!
//! # Invariants
//! - `Progress` and `Inventory` exist only for an existing `Account`.
//! - All three records share the store-assigned `AccountId`.

pub mod account;
pub mod inventory;
pub mod progress;
