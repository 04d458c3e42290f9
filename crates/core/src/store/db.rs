//! Store connection and operations.

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use thiserror::Error;

use super::schema::{init_schema, SchemaError};
use crate::document::{DocumentRecord, Link, Task};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("corrupt metadata for file {id}: {source}")]
    CorruptMetadata {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Query filter for reading document records back out.
#[derive(Debug, Clone, Default)]
pub struct FileQuery {
    /// Restrict to these filetypes.
    pub filetypes: Option<Vec<String>>,
    /// Restrict to files carrying at least one of these tags.
    pub tags: Option<Vec<String>>,
    /// Restrict to these extensions.
    pub extensions: Option<Vec<String>>,
    /// Restrict to file paths under this prefix.
    pub folder: Option<String>,
}

/// Handle over the four-table document index.
pub struct FileStore {
    conn: Connection,
}

impl FileStore {
    /// Open or create a store at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Create an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Replace the row set for one document: the `files` row and all child
    /// rows, in a single transaction.
    pub fn upsert_file(&mut self, record: &DocumentRecord) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        write_record(&tx, record)?;
        tx.commit()?;
        Ok(())
    }

    /// Remove a document and all its child rows. Returns whether a row
    /// existed.
    pub fn delete_file(&mut self, id: &str) -> Result<bool, StoreError> {
        let tx = self.conn.transaction()?;
        let rows = tx.execute("DELETE FROM files WHERE id = ?1", [id])?;
        tx.commit()?;
        Ok(rows > 0)
    }

    /// Apply one scan's outcome as a single unit of work: stale deletions
    /// first, then every upsert. Nothing is visible until commit.
    pub fn apply_batch(
        &mut self,
        deletes: &[String],
        upserts: &[DocumentRecord],
    ) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        for id in deletes {
            tx.execute("DELETE FROM files WHERE id = ?1", [id])?;
        }
        for record in upserts {
            write_record(&tx, record)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// File paths currently persisted, optionally restricted to one root.
    pub fn list_file_paths(&self, root: Option<&Path>) -> Result<Vec<String>, StoreError> {
        let mut paths = Vec::new();
        match root {
            Some(root) => {
                let prefix = format!("{}/%", root.to_string_lossy().trim_end_matches('/'));
                let mut stmt = self
                    .conn
                    .prepare("SELECT file_path FROM files WHERE file_path LIKE ?1 ORDER BY file_path")?;
                let rows = stmt.query_map([prefix], |row| row.get::<_, String>(0))?;
                for row in rows {
                    paths.push(row?);
                }
            }
            None => {
                let mut stmt =
                    self.conn.prepare("SELECT file_path FROM files ORDER BY file_path")?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                for row in rows {
                    paths.push(row?);
                }
            }
        }
        Ok(paths)
    }

    /// Fetch one document record, reconstituted from all four tables.
    pub fn get_file(&self, id: &str) -> Result<Option<DocumentRecord>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, file_path, extension, url_path, filetype, metadata
                 FROM files WHERE id = ?1",
                [id],
                row_to_file,
            )
            .optional()?;

        match row {
            Some(partial) => Ok(Some(self.hydrate(partial)?)),
            None => Ok(None),
        }
    }

    /// Query document records with filters.
    pub fn query_files(&self, query: &FileQuery) -> Result<Vec<DocumentRecord>, StoreError> {
        let mut sql = String::from(
            "SELECT id, file_path, extension, url_path, filetype, metadata
             FROM files WHERE 1=1",
        );
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        // An empty filter list restricts to nothing, so it short-circuits
        // into a constant-false predicate instead of an unbindable `IN ()`.
        if let Some(filetypes) = &query.filetypes {
            if filetypes.is_empty() {
                sql.push_str(" AND 1=0");
            } else {
                sql.push_str(&format!(
                    " AND filetype IN ({})",
                    placeholders(filetypes.len())
                ));
                for ft in filetypes {
                    params_vec.push(Box::new(ft.clone()));
                }
            }
        }

        if let Some(extensions) = &query.extensions {
            if extensions.is_empty() {
                sql.push_str(" AND 1=0");
            } else {
                sql.push_str(&format!(
                    " AND extension IN ({})",
                    placeholders(extensions.len())
                ));
                for ext in extensions {
                    params_vec.push(Box::new(ext.clone()));
                }
            }
        }

        if let Some(tags) = &query.tags {
            if tags.is_empty() {
                sql.push_str(" AND 1=0");
            } else {
                sql.push_str(&format!(
                    " AND EXISTS (SELECT 1 FROM tags t WHERE t.file_id = files.id AND t.tag IN ({}))",
                    placeholders(tags.len())
                ));
                for tag in tags {
                    params_vec.push(Box::new(tag.clone()));
                }
            }
        }

        if let Some(folder) = &query.folder {
            sql.push_str(" AND file_path LIKE ?");
            params_vec.push(Box::new(format!("{folder}%")));
        }

        sql.push_str(" ORDER BY file_path");

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_refs.as_slice(), row_to_file)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(self.hydrate(row?)?);
        }
        Ok(records)
    }

    fn hydrate(&self, mut record: DocumentRecord) -> Result<DocumentRecord, StoreError> {
        record.tags = {
            let mut stmt = self
                .conn
                .prepare("SELECT tag FROM tags WHERE file_id = ?1 ORDER BY id")?;
            let rows = stmt.query_map([&record.id], |row| row.get::<_, String>(0))?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        record.links = {
            let mut stmt = self.conn.prepare(
                "SELECT \"from\", \"to\", to_raw, link_text, internal, embed
                 FROM links WHERE file_id = ?1 ORDER BY id",
            )?;
            let rows = stmt.query_map([&record.id], |row| {
                Ok(Link {
                    from: row.get(0)?,
                    to: row.get(1)?,
                    to_raw: row.get(2)?,
                    text: row.get(3)?,
                    internal: row.get(4)?,
                    embed: row.get(5)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        record.tasks = {
            let mut stmt = self.conn.prepare(
                "SELECT description, checked, metadata, created, due, completion, start, scheduled, list
                 FROM tasks WHERE file_id = ?1 ORDER BY id",
            )?;
            let rows = stmt.query_map([&record.id], |row| {
                let metadata_json: String = row.get(2)?;
                Ok((
                    Task {
                        description: row.get(0)?,
                        checked: row.get(1)?,
                        metadata: Default::default(),
                        created: parse_date(row.get::<_, Option<String>>(3)?),
                        due: parse_date(row.get::<_, Option<String>>(4)?),
                        completion: parse_date(row.get::<_, Option<String>>(5)?),
                        start: parse_date(row.get::<_, Option<String>>(6)?),
                        scheduled: parse_date(row.get::<_, Option<String>>(7)?),
                        list: row.get(8)?,
                    },
                    metadata_json,
                ))
            })?;

            let mut tasks = Vec::new();
            for row in rows {
                let (mut task, metadata_json) = row?;
                task.metadata = serde_json::from_str(&metadata_json).map_err(|e| {
                    StoreError::CorruptMetadata { id: record.id.clone(), source: e }
                })?;
                tasks.push(task);
            }
            tasks
        };

        Ok(record)
    }

    pub fn count_files(&self) -> Result<i64, StoreError> {
        self.count("files")
    }

    pub fn count_tags(&self) -> Result<i64, StoreError> {
        self.count("tags")
    }

    pub fn count_links(&self) -> Result<i64, StoreError> {
        self.count("links")
    }

    pub fn count_tasks(&self) -> Result<i64, StoreError> {
        self.count("tasks")
    }

    fn count(&self, table: &str) -> Result<i64, StoreError> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {table}"),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

/// Write a record's full row set inside an open transaction.
fn write_record(tx: &Transaction<'_>, record: &DocumentRecord) -> Result<(), StoreError> {
    let metadata = serde_json::to_string(&record.metadata).map_err(|e| {
        StoreError::CorruptMetadata { id: record.id.clone(), source: e }
    })?;

    tx.execute(
        "INSERT INTO files (id, file_path, extension, url_path, filetype, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
            file_path = excluded.file_path,
            extension = excluded.extension,
            url_path = excluded.url_path,
            filetype = excluded.filetype,
            metadata = excluded.metadata",
        params![
            record.id,
            record.file_path,
            record.extension,
            record.url_path,
            record.filetype,
            metadata,
        ],
    )?;

    // Child rows vary in count between versions of the same file, so the
    // old set is dropped wholesale before the new one goes in.
    tx.execute("DELETE FROM tags WHERE file_id = ?1", [&record.id])?;
    tx.execute("DELETE FROM links WHERE file_id = ?1", [&record.id])?;
    tx.execute("DELETE FROM tasks WHERE file_id = ?1", [&record.id])?;

    for tag in &record.tags {
        tx.execute(
            "INSERT INTO tags (file_id, tag) VALUES (?1, ?2)",
            params![record.id, tag],
        )?;
    }

    for link in &record.links {
        tx.execute(
            "INSERT INTO links (file_id, \"from\", \"to\", to_raw, link_text, internal, embed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id,
                link.from,
                link.to,
                link.to_raw,
                link.text,
                link.internal,
                link.embed,
            ],
        )?;
    }

    for task in &record.tasks {
        let task_metadata = serde_json::to_string(&task.metadata).map_err(|e| {
            StoreError::CorruptMetadata { id: record.id.clone(), source: e }
        })?;
        tx.execute(
            "INSERT INTO tasks (file_id, description, checked, metadata, created, due, completion, start, scheduled, list)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.id,
                task.description,
                task.checked,
                task_metadata,
                task.created.map(format_date),
                task.due.map(format_date),
                task.completion.map(format_date),
                task.start.map(format_date),
                task.scheduled.map(format_date),
                task.list,
            ],
        )?;
    }

    Ok(())
}

fn row_to_file(row: &rusqlite::Row<'_>) -> Result<DocumentRecord, rusqlite::Error> {
    let metadata_json: String = row.get(5)?;
    Ok(DocumentRecord {
        id: row.get(0)?,
        file_path: row.get(1)?,
        extension: row.get(2)?,
        url_path: row.get(3)?,
        filetype: row.get(4)?,
        metadata: serde_json::from_str(&metadata_json).unwrap_or_default(),
        tags: Vec::new(),
        links: Vec::new(),
        tasks: Vec::new(),
    })
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_date(value: Option<String>) -> Option<NaiveDate> {
    value.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
