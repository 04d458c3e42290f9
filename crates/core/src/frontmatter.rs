//! YAML front-matter parsing.
//!
//! Front matter is delimited by `---` lines at the very start of the
//! document:
//!
//! ```markdown
//! ---
//! title: Hello
//! tags: [a, b]
//! ---
//! # Body
//! ```

use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontmatterError {
    #[error("invalid YAML front matter: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),
}

/// Result of splitting front matter from a document.
#[derive(Debug, Clone)]
pub struct SplitDocument {
    /// Parsed front-matter fields, in key order; `None` if no block present.
    pub fields: Option<BTreeMap<String, serde_yaml::Value>>,
    /// Everything after the front-matter block.
    pub body: String,
}

/// Parse the leading front-matter block, if any.
///
/// A missing closing delimiter means the document has no front matter; a
/// present but malformed block is an error (the extractor decides whether
/// that aborts the batch).
pub fn parse(content: &str) -> Result<SplitDocument, FrontmatterError> {
    let rest = match strip_delimiter(content) {
        Some(rest) => rest,
        None => return Ok(SplitDocument { fields: None, body: content.to_string() }),
    };

    let close = match find_closing_delimiter(rest) {
        Some(pos) => pos,
        None => return Ok(SplitDocument { fields: None, body: content.to_string() }),
    };

    let yaml = &rest[..close];
    let after = &rest[close..];
    // Skip the closing `---` line itself.
    let body = match after.find('\n') {
        Some(nl) => &after[nl + 1..],
        None => "",
    };

    let fields = if yaml.trim().is_empty() {
        BTreeMap::new()
    } else {
        serde_yaml::from_str(yaml)?
    };

    Ok(SplitDocument { fields: Some(fields), body: body.to_string() })
}

/// Strip the opening `---` line, returning the text after it.
fn strip_delimiter(content: &str) -> Option<&str> {
    let rest = content.strip_prefix("---")?;
    rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n"))
}

/// Byte offset of the line holding the closing `---`, relative to `content`.
fn find_closing_delimiter(content: &str) -> Option<usize> {
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_front_matter() {
        let doc = parse("# Hello\n\nbody").unwrap();
        assert!(doc.fields.is_none());
        assert_eq!(doc.body, "# Hello\n\nbody");
    }

    #[test]
    fn simple_fields() {
        let doc = parse("---\ntitle: Hello\ntype: blog\n---\n# Body").unwrap();
        let fields = doc.fields.unwrap();
        assert_eq!(fields["title"], serde_yaml::Value::String("Hello".into()));
        assert_eq!(fields["type"], serde_yaml::Value::String("blog".into()));
        assert_eq!(doc.body, "# Body");
    }

    #[test]
    fn list_field_preserves_order() {
        let doc = parse("---\ntags:\n  - b\n  - a\n---\n").unwrap();
        let fields = doc.fields.unwrap();
        let tags: Vec<String> =
            serde_yaml::from_value(fields["tags"].clone()).unwrap();
        assert_eq!(tags, vec!["b", "a"]);
    }

    #[test]
    fn empty_block() {
        let doc = parse("---\n---\nbody").unwrap();
        assert!(doc.fields.unwrap().is_empty());
        assert_eq!(doc.body, "body");
    }

    #[test]
    fn unterminated_block_is_plain_body() {
        let doc = parse("---\ntitle: Hello\nno closing").unwrap();
        assert!(doc.fields.is_none());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let result = parse("---\ntitle: [unclosed\n---\nbody");
        assert!(result.is_err());
    }

    #[test]
    fn crlf_delimiters() {
        let doc = parse("---\r\ntitle: Win\r\n---\r\nbody").unwrap();
        let fields = doc.fields.unwrap();
        assert_eq!(fields["title"], serde_yaml::Value::String("Win".into()));
    }
}
