//! Administrative account bootstrap.
//!
//! # Responsibility
//! - Reset the account store to an empty schema.
//! - Seed the `admin` account with starter progress and inventory when absent.
//!
//! # Invariants
//! - The schema reset runs on every call; seeding is conditional.
//! - Account, progress and inventory are written in one transaction, so a
//!   partial triple is never committed.
//! - The plaintext default password never reaches the log.
//!
//! # Safety
//! `initialize` wipes every table before it looks for the admin account.
//! Running it against a database with real players deletes them. It is a
//! one-shot setup action and assumes no other writer runs concurrently.

use crate::auth::password::{CredentialError, CredentialHasher};
use crate::context::{AppContext, DbLocation};
use crate::db::DbError;
use crate::model::account::{AccountId, NewAccount};
use crate::model::inventory::Inventory;
use crate::model::progress::Progress;
use crate::repo::account_repo::{AccountStore, RepoError, SqliteAccountStore};
use log::{error, info};
use rusqlite::TransactionBehavior;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_EMAIL: &str = "admin@mindcraft.com";
pub const ADMIN_DEFAULT_PASSWORD: &str = "admin123";

pub type BootstrapResult<T> = Result<T, BootstrapError>;

/// Failure of a bootstrap run. Every variant aborts the run.
#[derive(Debug)]
pub enum BootstrapError {
    /// Store unreachable, schema reset failed or commit failed.
    Db(DbError),
    Repo(RepoError),
    Credential(CredentialError),
}

impl Display for BootstrapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "database error: {err}"),
            Self::Repo(err) => write!(f, "account store error: {err}"),
            Self::Credential(err) => write!(f, "credential error: {err}"),
        }
    }
}

impl Error for BootstrapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Credential(err) => Some(err),
        }
    }
}

impl From<DbError> for BootstrapError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for BootstrapError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<RepoError> for BootstrapError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<CredentialError> for BootstrapError {
    fn from(value: CredentialError) -> Self {
        Self::Credential(value)
    }
}

/// Result of a successful bootstrap run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// Admin account and its dependents were created.
    Created {
        account_id: AccountId,
        username: String,
        /// Shown once to the operator; not stored anywhere.
        default_password: &'static str,
    },
    /// An admin account was already present; nothing was written.
    AlreadyInitialized { account_id: AccountId },
}

impl BootstrapOutcome {
    pub fn account_id(&self) -> AccountId {
        match self {
            Self::Created { account_id, .. } | Self::AlreadyInitialized { account_id } => {
                *account_id
            }
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created { .. })
    }

    /// Operator-facing console message for this outcome.
    pub fn notice(&self) -> String {
        match self {
            Self::Created {
                username,
                default_password,
                ..
            } => format!(
                "Database initialized successfully!\nAdmin user created:\nUsername: {username}\nPassword: {default_password}"
            ),
            Self::AlreadyInitialized { .. } => {
                "Database already initialized. Admin user exists.".to_string()
            }
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::AlreadyInitialized { .. } => "skipped",
        }
    }
}

/// Use-case service that seeds the administrative account.
pub struct BootstrapService<H: CredentialHasher> {
    hasher: H,
}

impl<H: CredentialHasher> BootstrapService<H> {
    pub fn new(hasher: H) -> Self {
        Self { hasher }
    }

    /// Enters a context at `location`, runs [`Self::initialize`] and exits.
    ///
    /// Failures after the context is entered are logged by `initialize`;
    /// this logs the ones that happen while entering it.
    pub fn run(&self, location: DbLocation) -> BootstrapResult<BootstrapOutcome> {
        let started_at = Instant::now();
        let display_location = location.to_string();
        let mut entered = false;

        AppContext::scope(location, |ctx| {
            entered = true;
            self.initialize(ctx)
        })
        .map_err(|err| {
            if !entered {
                error!(
                    "event=bootstrap module=service status=error stage=context_enter location={} duration_ms={} error={}",
                    display_location,
                    started_at.elapsed().as_millis(),
                    err
                );
            }
            err
        })
    }

    /// Resets the store and seeds the admin account if it is missing.
    ///
    /// # Contract
    /// - Always drops and recreates the schema first.
    /// - Returns `AlreadyInitialized` without writing when `admin` exists.
    /// - Otherwise commits account, progress and inventory together.
    ///
    /// # Errors
    /// - Any store, schema, hashing or commit failure aborts the run and
    ///   leaves no uncommitted seed rows behind.
    pub fn initialize(&self, ctx: &mut AppContext) -> BootstrapResult<BootstrapOutcome> {
        let started_at = Instant::now();
        info!(
            "event=bootstrap module=service status=start location={}",
            ctx.location()
        );

        let result = ctx
            .reset_schema()
            .map_err(BootstrapError::from)
            .and_then(|()| self.seed_in_transaction(ctx));

        match &result {
            Ok(outcome) => info!(
                "event=bootstrap module=service status=ok outcome={} account_id={} username={} duration_ms={}",
                outcome.label(),
                outcome.account_id(),
                ADMIN_USERNAME,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=bootstrap module=service status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }

        result
    }

    /// Seeds the admin triple through `store` unless `admin` already exists.
    ///
    /// Does not commit; the caller decides the transaction boundary.
    pub fn seed_admin<S: AccountStore + ?Sized>(
        &self,
        store: &S,
    ) -> BootstrapResult<BootstrapOutcome> {
        if let Some(existing) = store.find_account_by_username(ADMIN_USERNAME)? {
            return Ok(BootstrapOutcome::AlreadyInitialized {
                account_id: existing.id,
            });
        }

        let password_hash = self.hasher.hash(ADMIN_DEFAULT_PASSWORD)?;
        let account_id =
            store.create_account(&NewAccount::new(ADMIN_USERNAME, ADMIN_EMAIL, password_hash))?;
        store.create_progress(&Progress::starter(account_id))?;
        store.create_inventory(&Inventory::starter(account_id))?;

        Ok(BootstrapOutcome::Created {
            account_id,
            username: ADMIN_USERNAME.to_string(),
            default_password: ADMIN_DEFAULT_PASSWORD,
        })
    }

    fn seed_in_transaction(&self, ctx: &mut AppContext) -> BootstrapResult<BootstrapOutcome> {
        let tx = ctx
            .connection_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let outcome = {
            let store = SqliteAccountStore::try_new(&tx)?;
            self.seed_admin(&store)?
        };

        if outcome.is_created() {
            tx.commit()?;
        }
        // Dropping an uncommitted transaction rolls it back.
        Ok(outcome)
    }
}
