pub mod migrations;
pub mod queries;

use anyhow::Context;
use rusqlite::{Connection, ErrorCode};

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON; PRAGMA busy_timeout=5000;")
        .context("failed to set database pragmas")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}

/// True when the appointment overlap trigger rejected a write.
pub fn is_overlap_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(_, Some(msg))) if msg.contains("scheduling_conflict")
    )
}

pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation
    )
}
