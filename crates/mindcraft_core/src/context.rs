//! Scoped application context for storage work.
//!
//! # Responsibility
//! - Own the single SQLite connection a bootstrap run operates on.
//! - Bracket storage work with explicit enter/exit lifecycle events.
//!
//! # Invariants
//! - Storage operations only happen through a live `AppContext`.
//! - Entering never migrates; `reset_schema` is the only schema-create path,
//!   so a foreign or newer schema cannot block the reset.
//! - Exit runs on every path, including errors and unwinding, via `Drop`.

use crate::db::{
    open_db_in_memory_unmigrated, open_db_unmigrated, reset_schema, DbError, DbResult,
};
use log::info;
use rusqlite::Connection;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Instant;

/// Where the account store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    Memory,
}

impl Display for DbLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Memory => write!(f, ":memory:"),
        }
    }
}

/// Live storage environment; dropping it closes the connection.
pub struct AppContext {
    conn: Connection,
    location: DbLocation,
    entered_at: Instant,
}

impl AppContext {
    /// Opens the store at `location` and enters the context.
    ///
    /// The existing schema is left as found; call [`Self::reset_schema`]
    /// before using the account store.
    ///
    /// # Errors
    /// - Returns `DbError` when the database cannot be opened or configured.
    pub fn enter(location: DbLocation) -> DbResult<Self> {
        let conn = match &location {
            DbLocation::File(path) => open_db_unmigrated(path)?,
            DbLocation::Memory => open_db_in_memory_unmigrated()?,
        };
        info!("event=app_context_enter module=context status=ok location={location}");

        Ok(Self {
            conn,
            location,
            entered_at: Instant::now(),
        })
    }

    /// Runs `f` inside a freshly entered context and exits it afterwards.
    ///
    /// The context is released whether `f` succeeds or fails.
    pub fn scope<T, E>(
        location: DbLocation,
        f: impl FnOnce(&mut AppContext) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<DbError>,
    {
        let mut ctx = Self::enter(location)?;
        f(&mut ctx)
    }

    pub fn location(&self) -> &DbLocation {
        &self.location
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Drops and recreates the whole schema. All existing rows are lost.
    pub fn reset_schema(&mut self) -> DbResult<()> {
        reset_schema(&mut self.conn)
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        info!(
            "event=app_context_exit module=context status=ok location={} duration_ms={}",
            self.location,
            self.entered_at.elapsed().as_millis()
        );
    }
}
