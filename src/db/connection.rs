use std::fs;

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::config::DatabaseTarget;

/// Open the configured database, creating the parent directory for on-disk
/// stores, and make sure the schema exists before handing the connection out.
pub fn open_store(target: &DatabaseTarget) -> Result<Connection> {
    let conn = match target {
        DatabaseTarget::InMemory => {
            Connection::open_in_memory().context("failed to open in-memory SQLite database")?
        }
        DatabaseTarget::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).context("failed to create data directory")?;
            }
            Connection::open(path)
                .with_context(|| format!("failed to open SQLite database at {}", path.display()))?
        }
    };

    ensure_schema(&conn)?;
    tracing::info!(database = %target, "records store ready");
    Ok(conn)
}

/// Fresh, isolated in-memory store with the schema applied.
pub fn open_in_memory() -> Result<Connection> {
    open_store(&DatabaseTarget::InMemory)
}

/// Create the four tables if they are missing. Safe to run on every start.
/// Foreign keys are switched on per connection so the cascades below fire.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign keys")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            age INTEGER NOT NULL,
            grade INTEGER NOT NULL
        )",
        [],
    )
    .context("failed to create students table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS teachers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            subject TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create teachers table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS classes (
            subject TEXT PRIMARY KEY,
            teacher_id INTEGER NOT NULL,
            FOREIGN KEY(teacher_id) REFERENCES teachers(id) ON DELETE CASCADE
        )",
        [],
    )
    .context("failed to create classes table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS enrollments (
            student_id INTEGER NOT NULL,
            subject TEXT NOT NULL,
            PRIMARY KEY (student_id, subject),
            FOREIGN KEY(student_id) REFERENCES students(id) ON DELETE CASCADE,
            FOREIGN KEY(subject) REFERENCES classes(subject)
                ON DELETE CASCADE ON UPDATE CASCADE
        )",
        [],
    )
    .context("failed to create enrollments table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_name ON students(name)",
        [],
    )
    .context("failed to index student names")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_teachers_name ON teachers(name)",
        [],
    )
    .context("failed to index teacher names")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_classes_teacher ON classes(teacher_id)",
        [],
    )
    .context("failed to index class owners")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap();
        let names = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<String>, _>>()
            .unwrap();
        names
    }

    #[test]
    fn schema_creation_is_idempotent() {
        let conn = open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();

        let tables = table_names(&conn);
        for expected in ["classes", "enrollments", "students", "teachers"] {
            assert!(tables.iter().any(|t| t == expected), "missing {expected}");
        }
    }

    #[test]
    fn foreign_keys_are_enabled() {
        let conn = open_in_memory().unwrap();
        let enabled: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }
}
