use std::path::Path;

use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use super::DatabaseError;

/// Pooled SQLite connection manager. Concurrent async handlers each check
/// out a connection via `storage::Store` rather than serializing on one
/// global mutex.
pub type DbPool = r2d2::Pool<SqliteConnectionManager>;

const MIGRATIONS: &[(i64, &str)] = &[
    (1, include_str!("../../resources/migrations/001_initial.sql")),
    (2, include_str!("../../resources/migrations/002_medications.sql")),
    (3, include_str!("../../resources/migrations/003_health_data.sql")),
    (4, include_str!("../../resources/migrations/004_reports.sql")),
    (5, include_str!("../../resources/migrations/005_audit_log.sql")),
];

/// Open (or create) a file-backed SQLite database, run migrations, and
/// return a connection pool.
pub fn open_database(path: &Path) -> Result<DbPool, DatabaseError> {
    let manager = SqliteConnectionManager::file(path).with_init(configure_pragmas);
    let pool = r2d2::Pool::builder().build(manager)?;
    run_migrations(&pool.get()?)?;
    Ok(pool)
}

/// Open an in-memory database (for tests). Each checkout shares the same
/// in-memory database via a named, shared cache.
pub fn open_memory_database() -> Result<DbPool, DatabaseError> {
    let manager = SqliteConnectionManager::memory().with_init(configure_pragmas);
    let pool = r2d2::Pool::builder().max_size(1).build(manager)?;
    run_migrations(&pool.get()?)?;
    Ok(pool)
}

fn configure_pragmas(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA foreign_keys=ON;",
    )
}

/// Run all pending migrations, tracked in `schema_version`.
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let current_version = get_current_version(conn);

    for (version, sql) in MIGRATIONS {
        if *version > current_version {
            tracing::info!(version, "running migration");
            conn.execute_batch(sql)
                .map_err(|e| DatabaseError::MigrationFailed {
                    version: *version,
                    reason: e.to_string(),
                })?;
        }
    }

    Ok(())
}

fn get_current_version(conn: &Connection) -> i64 {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get::<_, i64>(0)
    })
    .unwrap_or(0)
}

/// Count user tables (for verification).
pub fn count_tables(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_initializes_all_tables() {
        let pool = open_memory_database().unwrap();
        let conn = pool.get().unwrap();
        // schema_version + 9 entity tables = 10
        let count = count_tables(&conn).unwrap();
        assert!(count >= 10, "expected at least 10 tables, got {count}");
    }

    #[test]
    fn schema_version_is_current() {
        let pool = open_memory_database().unwrap();
        let conn = pool.get().unwrap();
        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, 5);
    }

    #[test]
    fn migration_is_idempotent() {
        let pool = open_memory_database().unwrap();
        let conn = pool.get().unwrap();
        assert!(run_migrations(&conn).is_ok());
    }

    #[test]
    fn foreign_keys_enabled() {
        let pool = open_memory_database().unwrap();
        let conn = pool.get().unwrap();
        let fk: i64 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0)).unwrap();
        assert_eq!(fk, 1);
    }
}
