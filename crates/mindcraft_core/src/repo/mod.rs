//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the account store contract used by bootstrap orchestration.
//! - Isolate SQLite query and JSON encoding details from services.
//!
//! # Invariants
//! - Repository writes validate records before persistence.
//! - Repository APIs return semantic errors (`Duplicate`, `InvalidData`) in
//!   addition to DB transport errors.

pub mod account_repo;
