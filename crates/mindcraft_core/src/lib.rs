//! Core logic for the MindCraft game-progress backend bootstrap.
//! This crate owns the account store schema and the admin seeding procedure.

pub mod auth;
pub mod context;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use auth::password::{Argon2Hasher, CredentialError, CredentialHasher};
pub use context::{AppContext, DbLocation};
pub use logging::{
    default_log_level, init_console_logging, init_logging, logging_status, LogSink, LoggingError,
};
pub use model::account::{Account, AccountId, ModelValidationError, NewAccount};
pub use model::inventory::{Decoration, Inventory};
pub use model::progress::Progress;
pub use repo::account_repo::{AccountStore, RepoError, RepoResult, SqliteAccountStore};
pub use service::bootstrap_service::{
    BootstrapError, BootstrapOutcome, BootstrapResult, BootstrapService, ADMIN_DEFAULT_PASSWORD,
    ADMIN_EMAIL, ADMIN_USERNAME,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
