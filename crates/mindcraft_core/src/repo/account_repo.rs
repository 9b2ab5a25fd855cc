//! Account store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Create and query accounts plus their progress and inventory rows.
//! - Encode structured game state to JSON text at the storage boundary only.
//!
//! # Invariants
//! - Write paths validate records before SQL mutations.
//! - Read paths reject malformed persisted JSON instead of masking it.
//! - The store never commits on its own; callers own the transaction.

use crate::db::migrations::{latest_version, MANAGED_TABLES};
use crate::db::DbError;
use crate::model::account::{Account, AccountId, ModelValidationError, NewAccount};
use crate::model::inventory::Inventory;
use crate::model::progress::Progress;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from account store operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ModelValidationError),
    Db(DbError),
    /// Username already taken.
    Duplicate(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Duplicate(username) => write!(f, "username already exists: {username}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table missing: {table}"),
            Self::InvalidData(message) => write!(f, "invalid persisted account data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Duplicate(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence contract the bootstrap procedure depends on.
pub trait AccountStore {
    /// Returns the account with this exact username, if any.
    fn find_account_by_username(&self, username: &str) -> RepoResult<Option<Account>>;
    /// Inserts an account and returns the id assigned by the store.
    fn create_account(&self, account: &NewAccount) -> RepoResult<AccountId>;
    fn create_progress(&self, progress: &Progress) -> RepoResult<()>;
    fn create_inventory(&self, inventory: &Inventory) -> RepoResult<()>;
    fn get_progress(&self, account_id: AccountId) -> RepoResult<Option<Progress>>;
    fn get_inventory(&self, account_id: AccountId) -> RepoResult<Option<Inventory>>;
    fn count_accounts(&self) -> RepoResult<u64>;
}

/// SQLite-backed account store.
///
/// Accepts any `&Connection`, including a `rusqlite::Transaction` through
/// deref, so a caller can group several writes under one commit.
pub struct SqliteAccountStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAccountStore<'conn> {
    /// Creates a store after checking the connection schema is migrated.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_store_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl AccountStore for SqliteAccountStore<'_> {
    fn find_account_by_username(&self, username: &str) -> RepoResult<Option<Account>> {
        let account = self
            .conn
            .query_row(
                "SELECT id, username, email, password_hash
                 FROM accounts
                 WHERE username = ?1;",
                [username],
                parse_account_row,
            )
            .optional()?;
        Ok(account)
    }

    fn create_account(&self, account: &NewAccount) -> RepoResult<AccountId> {
        account.validate()?;

        let inserted = self.conn.execute(
            "INSERT INTO accounts (username, email, password_hash)
             VALUES (?1, ?2, ?3);",
            params![
                account.username.as_str(),
                account.email.as_str(),
                account.password_hash.as_str(),
            ],
        );

        match inserted {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(err) if is_unique_violation(&err) => {
                Err(RepoError::Duplicate(account.username.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn create_progress(&self, progress: &Progress) -> RepoResult<()> {
        progress.validate()?;

        self.conn.execute(
            "INSERT INTO player_progress (
                account_id,
                level,
                xp,
                coins,
                current_stage,
                unlocked_areas
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                progress.account_id,
                progress.level,
                to_db_counter(progress.xp, "xp")?,
                to_db_counter(progress.coins, "coins")?,
                progress.current_stage,
                encode_json(&progress.unlocked_areas, "unlocked_areas")?,
            ],
        )?;

        Ok(())
    }

    fn create_inventory(&self, inventory: &Inventory) -> RepoResult<()> {
        inventory.validate()?;

        self.conn.execute(
            "INSERT INTO player_inventory (
                account_id,
                items,
                home_decorations,
                character_cards,
                unlocked_characters
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                inventory.account_id,
                encode_json(&inventory.items, "items")?,
                encode_json(&inventory.home_decorations, "home_decorations")?,
                encode_json(&inventory.character_cards, "character_cards")?,
                encode_json(&inventory.unlocked_characters, "unlocked_characters")?,
            ],
        )?;

        Ok(())
    }

    fn get_progress(&self, account_id: AccountId) -> RepoResult<Option<Progress>> {
        let mut stmt = self.conn.prepare(
            "SELECT account_id, level, xp, coins, current_stage, unlocked_areas
             FROM player_progress
             WHERE account_id = ?1;",
        )?;

        let mut rows = stmt.query([account_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_progress_row(row)?));
        }

        Ok(None)
    }

    fn get_inventory(&self, account_id: AccountId) -> RepoResult<Option<Inventory>> {
        let mut stmt = self.conn.prepare(
            "SELECT account_id, items, home_decorations, character_cards, unlocked_characters
             FROM player_inventory
             WHERE account_id = ?1;",
        )?;

        let mut rows = stmt.query([account_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_inventory_row(row)?));
        }

        Ok(None)
    }

    fn count_accounts(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM accounts;", [], |row| row.get(0))?;
        from_db_counter(count, "accounts.count")
    }
}

fn parse_account_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get("id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
    })
}

fn parse_progress_row(row: &Row<'_>) -> RepoResult<Progress> {
    let progress = Progress {
        account_id: row.get("account_id")?,
        level: row.get("level")?,
        xp: from_db_counter(row.get("xp")?, "player_progress.xp")?,
        coins: from_db_counter(row.get("coins")?, "player_progress.coins")?,
        current_stage: row.get("current_stage")?,
        unlocked_areas: decode_json(row, "unlocked_areas", "player_progress")?,
    };
    progress.validate()?;
    Ok(progress)
}

fn parse_inventory_row(row: &Row<'_>) -> RepoResult<Inventory> {
    let inventory = Inventory {
        account_id: row.get("account_id")?,
        items: decode_json(row, "items", "player_inventory")?,
        home_decorations: decode_json(row, "home_decorations", "player_inventory")?,
        character_cards: decode_json(row, "character_cards", "player_inventory")?,
        unlocked_characters: decode_json(row, "unlocked_characters", "player_inventory")?,
    };
    inventory.validate()?;
    Ok(inventory)
}

fn encode_json<T: Serialize + ?Sized>(value: &T, field: &str) -> RepoResult<String> {
    serde_json::to_string(value)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode `{field}`: {err}")))
}

fn decode_json<T: DeserializeOwned>(
    row: &Row<'_>,
    column: &'static str,
    table: &'static str,
) -> RepoResult<T> {
    let text: String = row.get(column)?;
    serde_json::from_str(&text).map_err(|err| {
        RepoError::InvalidData(format!("invalid json `{text}` in {table}.{column}: {err}"))
    })
}

fn to_db_counter(value: u64, field: &str) -> RepoResult<i64> {
    i64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("{field} value {value} exceeds storage range")))
}

fn from_db_counter(value: i64, column: &str) -> RepoResult<u64> {
    u64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("negative value `{value}` in {column}")))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn ensure_store_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in MANAGED_TABLES {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(*table));
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
