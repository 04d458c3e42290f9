//! Document records and the pipeline that builds them.
//!
//! This module composes the input normaliser, identity resolver, facet
//! extractor and caller-supplied computed fields into one canonical record
//! per file.

pub mod builder;
pub mod identity;
pub mod types;

pub use builder::{build_document, BuildError, BuildOptions, ComputedField, PathToUrlResolver};
pub use identity::{document_id, resolve_identity, ResolvedIdentity, MEMORY_PATH};
pub use types::{DocumentRecord, Link, Metadata, Task};
