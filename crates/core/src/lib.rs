//! mddb-core: turn a folder of Markdown/MDX files into a relational index.
//!
//! The crate is organised around one pipeline:
//! filesystem → [`scan`] / [`watch`] → [`document`] (normalise, identify,
//! extract facets, compute fields) → [`schema`] validation → [`store`].
//! The [`markdowndb::MarkdownDb`] façade wires the pieces together.

#![deny(clippy::all)]

pub mod config;
pub mod document;
pub mod extract;
pub mod frontmatter;
pub mod markdowndb;
pub mod scan;
pub mod schema;
pub mod source;
pub mod store;
pub mod watch;

pub use document::{
    build_document, BuildError, BuildOptions, ComputedField, DocumentRecord, Link,
    PathToUrlResolver, Task,
};
pub use markdowndb::{IndexFolderError, IndexOptions, IndexStats, MarkdownDb, WatchSession};
pub use schema::{BatchValidationError, SchemaRegistry};
pub use source::MarkdownSource;
pub use store::{FileQuery, FileStore, StoreError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
