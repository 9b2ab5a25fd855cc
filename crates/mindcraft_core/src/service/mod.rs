//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate context, repository and hashing calls into one-shot actions.
//! - Keep the CLI layer decoupled from storage details.

pub mod bootstrap_service;
