//! Document building orchestration.

use std::path::Path;

use thiserror::Error;

use super::identity::resolve_identity;
use super::types::{DocumentRecord, Metadata, Task};
use crate::extract::{self, DocumentAst, ExtractError, ParseContext};
use crate::source::MarkdownSource;

/// Extensions routed through the facet extractor. Everything else is still
/// indexed as a bare file record - callers may want to query non-markdown
/// assets referenced by markdown.
const SUPPORTED_EXTENSIONS: [&str; 2] = ["md", "mdx"];

/// A caller-supplied function that may mutate the partially built record.
///
/// Computed fields run in registration order, after metadata/links/tags are
/// set and before `tasks` is populated from `metadata["tasks"]`; a computed
/// field cannot see or override the tasks extracted this pass.
pub type ComputedField = Box<dyn Fn(&mut DocumentRecord, &DocumentAst) + Send + Sync>;

/// Maps a relative path to a site URL. Identity by default.
pub type PathToUrlResolver = Box<dyn Fn(&str) -> String + Send + Sync>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to read source: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Options for building one document record.
#[derive(Default)]
pub struct BuildOptions<'a> {
    /// Backing file, if any; `None` for ad-hoc in-memory documents.
    pub file_path: Option<&'a Path>,
    /// Indexed root, used to derive the relative path.
    pub root_folder: Option<&'a Path>,
    pub path_to_url: Option<&'a PathToUrlResolver>,
    /// Relative paths of the corpus, for wikilink resolution.
    pub permalinks: &'a [String],
    pub computed_fields: &'a [ComputedField],
}

/// Build one canonical document record from a source.
pub fn build_document(
    source: MarkdownSource,
    options: &BuildOptions<'_>,
) -> Result<DocumentRecord, BuildError> {
    let text = source.read_to_string()?;
    let identity = resolve_identity(options.file_path, options.root_folder, &text);

    let url_path = match options.path_to_url {
        Some(resolver) => resolver(&identity.relative_path),
        None => identity.relative_path.clone(),
    };

    let mut record = DocumentRecord {
        id: identity.id,
        file_path: identity.file_path,
        extension: identity.extension,
        url_path,
        filetype: None,
        metadata: Metadata::new(),
        tags: Vec::new(),
        links: Vec::new(),
        tasks: Vec::new(),
    };

    if !SUPPORTED_EXTENSIONS.contains(&record.extension.as_str()) {
        return Ok(record);
    }

    let ctx = ParseContext {
        from: &identity.relative_path,
        permalinks: options.permalinks,
    };
    let parsed = extract::parse_file(&text, &ctx)?;

    record.metadata = parsed.metadata;
    record.links = parsed.links;
    record.filetype = record
        .metadata
        .get("type")
        .and_then(|v| v.as_str())
        .map(String::from);
    record.tags = string_list(record.metadata.get("tags"));

    for field in options.computed_fields {
        field(&mut record, &parsed.ast);
    }

    // Tasks come last so computed fields cannot observe or override them.
    record.tasks = tasks_from_metadata(&record.metadata);

    Ok(record)
}

fn string_list(value: Option<&serde_json::Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|items| {
            items.iter().filter_map(|v| v.as_str()).map(String::from).collect()
        })
        .unwrap_or_default()
}

fn tasks_from_metadata(metadata: &Metadata) -> Vec<Task> {
    match metadata.get("tasks") {
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_default(),
        None => Vec::new(),
    }
}
