//! Ordered schema migrations for the parcel database.
//!
//! # Invariants
//! - `version` values are strictly increasing, starting at 1.
//! - Pending steps share one transaction; the first failing step aborts all
//!   of them and is reported as `DbError::Migration`.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::{Connection, Transaction};

#[derive(Debug, Clone, Copy)]
pub(crate) struct Migration {
    pub(crate) version: u32,
    pub(crate) sql: &'static str,
}

impl Migration {
    fn apply(&self, tx: &Transaction<'_>) -> rusqlite::Result<()> {
        tx.execute_batch(self.sql)?;
        tx.pragma_update(None, "user_version", self.version)
    }
}

const PARCEL_MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("0001_parcel.sql"),
    },
    Migration {
        version: 2,
        sql: include_str!("0002_parcel_client_index.sql"),
    },
];

/// Latest schema version this build knows about.
pub fn latest_version() -> u32 {
    final_version(PARCEL_MIGRATIONS)
}

/// Reads the schema version recorded on the connection.
pub fn current_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Brings the `parcel` schema up to `latest_version()`.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    migrate(conn, PARCEL_MIGRATIONS)
}

fn final_version(steps: &[Migration]) -> u32 {
    steps.last().map_or(0, |step| step.version)
}

pub(crate) fn migrate(conn: &mut Connection, steps: &[Migration]) -> DbResult<()> {
    let from = current_version(conn)?;
    let to = final_version(steps);

    if from > to {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: to,
        });
    }
    let mut pending = steps.iter().filter(|step| step.version > from).peekable();
    if pending.peek().is_none() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in pending {
        if let Err(source) = step.apply(&tx) {
            error!(
                "event=db_migrate module=db status=error version={} error={source}",
                step.version
            );
            return Err(DbError::Migration {
                version: step.version,
                source,
            });
        }
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={from} to_version={to}");
    Ok(())
}
