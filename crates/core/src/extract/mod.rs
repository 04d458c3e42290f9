//! Facet extraction: front matter, links and tasks from raw markdown.
//!
//! `parse_file` has a fixed result shape - `{ ast, metadata, links }` - and
//! callers never look inside the AST except to hand it to computed-field
//! functions. Extracted tasks are written back into `metadata["tasks"]`, and
//! the document builder pulls them out as the last build step; that ordering
//! is observable and must not change.

pub mod ast;
pub mod links;
pub mod tasks;

use thiserror::Error;

use crate::document::types::Metadata;
use crate::document::Link;
use crate::frontmatter::{self, FrontmatterError};

pub use ast::{DocumentAst, Heading, TaskItem};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Frontmatter(#[from] FrontmatterError),

    #[error("front matter is not representable as JSON: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// Resolver context handed to the extractor.
pub struct ParseContext<'a> {
    /// Source document's relative path.
    pub from: &'a str,
    /// Relative paths of the indexed corpus, for wikilink resolution.
    pub permalinks: &'a [String],
}

/// Fixed extractor result shape.
pub struct ParsedFile {
    pub ast: DocumentAst,
    pub metadata: Metadata,
    pub links: Vec<Link>,
}

/// Extract all facets from one markdown document.
pub fn parse_file(source: &str, ctx: &ParseContext) -> Result<ParsedFile, ExtractError> {
    let doc = frontmatter::parse(source)?;

    let mut metadata = Metadata::new();
    if let Some(fields) = doc.fields {
        for (key, value) in fields {
            metadata.insert(key, serde_json::to_value(&value)?);
        }
    }

    let ast = DocumentAst::parse(&doc.body);
    let links = links::extract_links(&doc.body, ctx);

    merge_inline_tags(&mut metadata, &doc.body);

    let tasks = tasks::from_items(&ast.task_items);
    metadata.insert("tasks".to_string(), serde_json::to_value(&tasks)?);

    Ok(ParsedFile { ast, metadata, links })
}

/// Merge `#tag` tokens from the body into `metadata["tags"]`, after the
/// front-matter tags, deduplicated, order preserved.
fn merge_inline_tags(metadata: &mut Metadata, body: &str) {
    let inline = tags_in_body(body);

    let mut tags: Vec<String> = metadata
        .get("tags")
        .and_then(|v| v.as_array())
        .map(|items| {
            items.iter().filter_map(|v| v.as_str()).map(String::from).collect()
        })
        .unwrap_or_default();

    for tag in inline {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    if !tags.is_empty() || metadata.contains_key("tags") {
        metadata.insert("tags".to_string(), serde_json::json!(tags));
    }
}

fn tags_in_body(body: &str) -> Vec<String> {
    use regex::Regex;
    use std::sync::LazyLock;

    static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
        // `#tag` preceded by start-of-line or whitespace; headings (`# `)
        // do not match because the first tag character must not be a space.
        Regex::new(r"(?:^|\s)#([\p{L}\p{N}_][\p{L}\p{N}_/-]*)").unwrap()
    });

    let mut tags = Vec::new();
    for line in lines_outside_fences(body) {
        for cap in TAG_RE.captures_iter(line) {
            let tag = cap[1].to_string();
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }
    tags
}

/// Lines of `body` outside fenced code blocks. Fence delimiter lines
/// themselves are excluded too.
pub(crate) fn lines_outside_fences(body: &str) -> impl Iterator<Item = &str> {
    let mut in_fence = false;
    body.lines().filter(move |line| {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            return false;
        }
        !in_fence
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(from: &'a str, permalinks: &'a [String]) -> ParseContext<'a> {
        ParseContext { from, permalinks }
    }

    #[test]
    fn front_matter_lands_in_metadata() {
        let parsed = parse_file(
            "---\ntitle: Homepage\ntype: blog\n---\n# Hi\n",
            &ctx("index.md", &[]),
        )
        .unwrap();
        assert_eq!(parsed.metadata["title"], serde_json::json!("Homepage"));
        assert_eq!(parsed.metadata["type"], serde_json::json!("blog"));
    }

    #[test]
    fn tasks_are_written_into_metadata() {
        let parsed = parse_file(
            "# List\n\n- [ ] buy milk\n- [x] done thing\n",
            &ctx("todo.md", &[]),
        )
        .unwrap();
        let tasks = parsed.metadata["tasks"].as_array().unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0]["description"], serde_json::json!("buy milk"));
        assert_eq!(tasks[0]["checked"], serde_json::json!(false));
        assert_eq!(tasks[1]["checked"], serde_json::json!(true));
    }

    #[test]
    fn inline_tags_merge_after_front_matter_tags() {
        let parsed = parse_file(
            "---\ntags: [a, b]\n---\nBody with #b and #c and #日本語タグ.\n",
            &ctx("t.md", &[]),
        )
        .unwrap();
        let tags: Vec<String> =
            serde_json::from_value(parsed.metadata["tags"].clone()).unwrap();
        assert_eq!(tags, vec!["a", "b", "c", "日本語タグ"]);
    }

    #[test]
    fn fenced_code_yields_no_tags() {
        let parsed = parse_file(
            "Body with #real.\n\n```sh\ngrep '#fenced' file\n```\n",
            &ctx("t.md", &[]),
        )
        .unwrap();
        let tags: Vec<String> =
            serde_json::from_value(parsed.metadata["tags"].clone()).unwrap();
        assert_eq!(tags, vec!["real"]);
    }

    #[test]
    fn headings_do_not_become_tags() {
        let parsed = parse_file("# Heading\n\nplain body\n", &ctx("h.md", &[])).unwrap();
        assert!(parsed.metadata.get("tags").is_none());
    }

    #[test]
    fn malformed_front_matter_is_an_extraction_error() {
        let result = parse_file("---\ntitle: [broken\n---\n", &ctx("bad.md", &[]));
        assert!(matches!(result, Err(ExtractError::Frontmatter(_))));
    }
}
