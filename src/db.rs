//! Database handle and embedded schema migrations.
//!
//! Uses SQLite with migrations managed via `PRAGMA user_version`. All
//! ids are UUIDv4 strings and all rows carry RFC 3339 timestamps.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: users, subjects with activity counters, lag journal
    // hierarchy, question bank hierarchy
    r#"
    CREATE TABLE users (
        id            TEXT PRIMARY KEY,
        email         TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        token         TEXT,
        created_at    TEXT NOT NULL,
        updated_at    TEXT NOT NULL
    );

    CREATE TABLE subjects (
        id             TEXT PRIMARY KEY,
        user_id        TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        subject_name   TEXT NOT NULL,
        dpp_count      INTEGER NOT NULL DEFAULT 0,
        class_count    INTEGER NOT NULL DEFAULT 0,
        pyq_count      INTEGER NOT NULL DEFAULT 0,
        book_count     INTEGER NOT NULL DEFAULT 0,
        chat_gpt_count INTEGER NOT NULL DEFAULT 0,
        created_at     TEXT NOT NULL,
        updated_at     TEXT NOT NULL
    );

    CREATE TABLE lag_subjects (
        id           TEXT PRIMARY KEY,
        user_id      TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        subject_name TEXT NOT NULL,
        created_at   TEXT NOT NULL,
        updated_at   TEXT NOT NULL
    );

    CREATE TABLE lag_chapters (
        id             TEXT PRIMARY KEY,
        lag_subject_id TEXT NOT NULL REFERENCES lag_subjects(id) ON DELETE CASCADE,
        chapter_name   TEXT NOT NULL,
        created_at     TEXT NOT NULL,
        updated_at     TEXT NOT NULL
    );

    CREATE TABLE lag_bodies (
        id             TEXT PRIMARY KEY,
        lag_chapter_id TEXT NOT NULL REFERENCES lag_chapters(id) ON DELETE CASCADE,
        body           TEXT NOT NULL,
        category       TEXT,
        created_at     TEXT NOT NULL,
        updated_at     TEXT NOT NULL
    );

    CREATE TABLE qb_subjects (
        id           TEXT PRIMARY KEY,
        user_id      TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        subject_name TEXT NOT NULL,
        created_at   TEXT NOT NULL,
        updated_at   TEXT NOT NULL
    );

    CREATE TABLE qb_chapters (
        id            TEXT PRIMARY KEY,
        qb_subject_id TEXT NOT NULL REFERENCES qb_subjects(id) ON DELETE CASCADE,
        chapter_name  TEXT NOT NULL,
        created_at    TEXT NOT NULL,
        updated_at    TEXT NOT NULL
    );

    CREATE TABLE qb_questions (
        id            TEXT PRIMARY KEY,
        qb_chapter_id TEXT NOT NULL REFERENCES qb_chapters(id) ON DELETE CASCADE,
        src           TEXT NOT NULL,
        answer        REAL NOT NULL,
        created_at    TEXT NOT NULL,
        updated_at    TEXT NOT NULL
    );

    CREATE INDEX idx_subjects_user ON subjects(user_id);
    CREATE INDEX idx_lag_subjects_user ON lag_subjects(user_id);
    CREATE INDEX idx_lag_chapters_subject ON lag_chapters(lag_subject_id);
    CREATE INDEX idx_lag_bodies_chapter ON lag_bodies(lag_chapter_id);
    CREATE INDEX idx_lag_bodies_category ON lag_bodies(category);
    CREATE INDEX idx_qb_subjects_user ON qb_subjects(user_id);
    CREATE INDEX idx_qb_chapters_subject ON qb_chapters(qb_subject_id);
    CREATE INDEX idx_qb_questions_chapter ON qb_questions(qb_chapter_id);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "running migration");
            conn.execute_batch(migration)
                .with_context(|| format!("migration {} failed", version))?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn schema_version(conn: &Connection) -> Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}

/// Database handle (single shared connection)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {:?}", parent))?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database {:?}", path))?;

        // WAL for crash recovery, real foreign keys for the cascades
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        run_migrations(&self.connection())
    }

    /// Get the underlying connection
    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_create_tables() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN (
                    'users', 'subjects', 'lag_subjects', 'lag_chapters', 'lag_bodies',
                    'qb_subjects', 'qb_chapters', 'qb_questions'
                )",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(count, 8);
        assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();

        let conn = db.connection();
        let result = conn.execute(
            "INSERT INTO subjects (id, user_id, subject_name, created_at, updated_at)
             VALUES ('s1', 'no-such-user', 'Physics', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
            [],
        );
        assert!(result.is_err(), "orphan insert should be rejected");
    }

    #[test]
    fn test_open_file_backed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studylog.db");

        let db = Database::open(&path).unwrap();
        db.migrate().unwrap();
        drop(db);

        // Reopen and migrate again; nothing to do, nothing lost
        let db = Database::open(&path).unwrap();
        db.migrate().unwrap();
        assert_eq!(schema_version(&db.connection()).unwrap(), SCHEMA_VERSION);
    }
}
