//! SQLite schema definition and migrations.

use rusqlite::Connection;
use thiserror::Error;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("schema version {found} is newer than supported {supported}")]
    VersionTooNew { found: i32, supported: i32 },
}

/// Initialize or migrate the database schema. Idempotent.
pub fn init_schema(conn: &Connection) -> Result<(), SchemaError> {
    let version = get_schema_version(conn)?;

    if version == 0 {
        create_schema_v1(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if version > SCHEMA_VERSION {
        return Err(SchemaError::VersionTooNew {
            found: version,
            supported: SCHEMA_VERSION,
        });
    }
    // version == SCHEMA_VERSION needs nothing; future migrations slot in
    // here when SCHEMA_VERSION grows.

    Ok(())
}

fn get_schema_version(conn: &Connection) -> Result<i32, SchemaError> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: i32 =
        conn.query_row("SELECT version FROM schema_version", [], |row| row.get(0))?;
    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), SchemaError> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?1)",
        [version],
    )?;
    Ok(())
}

fn create_schema_v1(conn: &Connection) -> Result<(), SchemaError> {
    conn.execute_batch(
        r#"
        -- Schema version tracking
        CREATE TABLE schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL
        );

        -- One row per indexed file
        CREATE TABLE files (
            id TEXT PRIMARY KEY,
            file_path TEXT NOT NULL UNIQUE,
            extension TEXT NOT NULL,
            url_path TEXT NOT NULL,
            filetype TEXT,
            metadata TEXT NOT NULL DEFAULT '{}'
        );

        CREATE INDEX idx_files_filetype ON files(filetype);
        CREATE INDEX idx_files_extension ON files(extension);

        -- Tag facts, owned by their file row
        CREATE TABLE tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            file_id TEXT NOT NULL REFERENCES files(id) ON DELETE CASCADE,
            tag TEXT NOT NULL
        );

        CREATE INDEX idx_tags_file ON tags(file_id);
        CREATE INDEX idx_tags_tag ON tags(tag);

        -- Link facts, in document order via rowid
        CREATE TABLE links (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            file_id TEXT NOT NULL REFERENCES files(id) ON DELETE CASCADE,
            "from" TEXT NOT NULL,
            "to" TEXT NOT NULL,
            to_raw TEXT NOT NULL,
            link_text TEXT NOT NULL,
            internal INTEGER NOT NULL,
            embed INTEGER NOT NULL
        );

        CREATE INDEX idx_links_file ON links(file_id);
        CREATE INDEX idx_links_to ON links("to");

        -- Task facts, in document order via rowid
        CREATE TABLE tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            file_id TEXT NOT NULL REFERENCES files(id) ON DELETE CASCADE,
            description TEXT NOT NULL,
            checked INTEGER NOT NULL,
            metadata TEXT NOT NULL DEFAULT '{}',
            created TEXT,
            due TEXT,
            completion TEXT,
            start TEXT,
            scheduled TEXT,
            list TEXT
        );

        CREATE INDEX idx_tasks_file ON tasks(file_id);
        CREATE INDEX idx_tasks_checked ON tasks(checked);
        "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn newer_version_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        set_schema_version(&conn, SCHEMA_VERSION + 1).unwrap();
        assert!(matches!(
            init_schema(&conn),
            Err(SchemaError::VersionTooNew { .. })
        ));
    }

    #[test]
    fn all_four_tables_exist() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        for table in ["files", "tags", "links", "tasks"] {
            let found: bool = conn
                .query_row(
                    "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert!(found, "missing table {table}");
        }
    }
}
