//! SQLite-backed relational store for document records.
//!
//! Four tables - `files`, `tags`, `links`, `tasks` - keyed by the document
//! id. Child rows always travel in the same transaction as their parent
//! `files` row, so no child row can reference a missing file.

pub mod db;
pub mod schema;

pub use db::{FileQuery, FileStore, StoreError};
pub use schema::{SchemaError, SCHEMA_VERSION};
