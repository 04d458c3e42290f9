//! Stable document identity and path resolution.
//!
//! Identity hashes the relative *path*, not the content: edits to a file
//! keep its id, so upserts replace the existing row. Renames therefore
//! become delete + create, which is accepted and documented.

use std::path::Path;

use sha2::{Digest, Sha256};

/// Relative path assigned to documents with no backing file.
pub const MEMORY_PATH: &str = "<memory>";

/// Identity facts derived from a file's location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub id: String,
    /// Path relative to the indexed root; [`MEMORY_PATH`] when no file
    /// backs the document.
    pub relative_path: String,
    /// Caller-supplied path, or the relative path for path-less documents.
    pub file_path: String,
    /// Lower-cased extension without the dot; `md` for path-less documents.
    pub extension: String,
}

/// Compute the stable id for a document.
///
/// Hashes the relative-path bytes when a path exists, the raw source text
/// otherwise, so purely in-memory documents still get a deterministic id.
pub fn document_id(relative_path: Option<&str>, source: &str) -> String {
    let bytes = match relative_path {
        Some(path) => path.as_bytes(),
        None => source.as_bytes(),
    };
    hex::encode(Sha256::digest(bytes))
}

/// Resolve identity for a document at `file_path` under `root_folder`.
///
/// With no root the file path is used as the relative path unchanged; with
/// no file path at all the document is treated as in-memory.
pub fn resolve_identity(
    file_path: Option<&Path>,
    root_folder: Option<&Path>,
    source: &str,
) -> ResolvedIdentity {
    match file_path {
        Some(path) => {
            let relative = relative_to(root_folder, path);
            ResolvedIdentity {
                id: document_id(Some(&relative), source),
                extension: extension_of(&relative),
                file_path: path.to_string_lossy().into_owned(),
                relative_path: relative,
            }
        }
        None => ResolvedIdentity {
            id: document_id(None, source),
            relative_path: MEMORY_PATH.to_string(),
            file_path: MEMORY_PATH.to_string(),
            extension: "md".to_string(),
        },
    }
}

fn relative_to(root: Option<&Path>, path: &Path) -> String {
    let relative = match root {
        Some(root) => path.strip_prefix(root).unwrap_or(path),
        None => path,
    };
    relative.to_string_lossy().into_owned()
}

fn extension_of(relative_path: &str) -> String {
    Path::new(relative_path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}
