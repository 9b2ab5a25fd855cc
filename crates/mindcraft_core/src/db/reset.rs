//! Destructive schema reset.
//!
//! # Responsibility
//! - Drop every user-defined table and view in a database.
//! - Recreate the schema from the migration registry.
//!
//! # Invariants
//! - `user_version` is 0 after a drop and `latest_version()` after a reset.
//! - `foreign_keys` is re-enabled on every exit path.
//!
//! # Safety
//! A reset discards all rows, not only bootstrap data. Never point it at a
//! database holding live player data you want to keep.

use super::migrations::apply_migrations;
use super::DbResult;
use log::{error, info, warn};
use rusqlite::Connection;
use std::time::Instant;

const LIST_SCHEMA_OBJECTS_SQL: &str = "SELECT type, name
FROM sqlite_master
WHERE type IN ('table', 'view')
  AND name NOT LIKE 'sqlite^_%' ESCAPE '^'
ORDER BY type = 'table', name;";

/// Drops all user tables and views and resets `PRAGMA user_version` to 0.
///
/// Returns the number of dropped schema objects.
pub fn drop_schema(conn: &mut Connection) -> DbResult<usize> {
    // PRAGMA foreign_keys is a no-op inside a transaction.
    conn.execute_batch("PRAGMA foreign_keys = OFF;")?;
    let dropped = drop_all_objects(conn);
    let restored = conn.execute_batch("PRAGMA foreign_keys = ON;");

    let dropped = dropped?;
    restored?;
    Ok(dropped)
}

/// Drops the whole schema, then recreates it empty at the latest version.
///
/// # Side effects
/// - Every existing row in the database is lost.
/// - Emits `schema_reset` logging events with duration and status.
pub fn reset_schema(conn: &mut Connection) -> DbResult<()> {
    let started_at = Instant::now();
    info!("event=schema_reset module=db status=start");

    let result = drop_schema(conn).and_then(|dropped| {
        if dropped > 0 {
            warn!("event=schema_drop module=db status=ok dropped_objects={dropped}");
        }
        apply_migrations(conn)
    });

    match &result {
        Ok(()) => info!(
            "event=schema_reset module=db status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=schema_reset module=db status=error duration_ms={} error_code=schema_reset_failed error={}",
            started_at.elapsed().as_millis(),
            err
        ),
    }

    result
}

fn drop_all_objects(conn: &mut Connection) -> DbResult<usize> {
    let tx = conn.transaction()?;

    let objects = {
        let mut stmt = tx.prepare(LIST_SCHEMA_OBJECTS_SQL)?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        rows.collect::<Result<Vec<_>, _>>()?
    };

    for (kind, name) in &objects {
        let keyword = if kind == "view" { "VIEW" } else { "TABLE" };
        tx.execute_batch(&format!(
            "DROP {keyword} IF EXISTS {};",
            quote_identifier(name)
        ))?;
    }
    tx.execute_batch("PRAGMA user_version = 0;")?;
    tx.commit()?;

    Ok(objects.len())
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
