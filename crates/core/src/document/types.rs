//! Record types for indexed files.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Free-form key/value metadata decoded from front matter.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Canonical structured representation of one indexed file.
///
/// `id` is a deterministic function of the file's path relative to the
/// indexed root, so edits to a file update its existing row instead of
/// creating a duplicate. The derived collections (`tags`, `links`, `tasks`)
/// are owned by the record and cascade with it in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Stable identifier: sha256 over the relative-path bytes (or over the
    /// raw source text for path-less documents).
    pub id: String,
    /// Absolute or caller-supplied path.
    pub file_path: String,
    /// Lower-cased file extension without the leading dot.
    pub extension: String,
    /// Site-relative URL produced by the path→URL resolver.
    pub url_path: String,
    /// Caller-declared document type from `metadata.type`; `None` if absent
    /// or the extension is unsupported.
    pub filetype: Option<String>,
    /// Front-matter metadata; empty for unsupported extensions.
    pub metadata: Metadata,
    /// Tag set (order-irrelevant, stored in extraction order).
    pub tags: Vec<String>,
    /// Outgoing links, in document order.
    pub links: Vec<Link>,
    /// Checklist tasks, in document order.
    pub tasks: Vec<Task>,
}

/// A link fact extracted from a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Source document's relative path.
    pub from: String,
    /// Resolved target; equals `to_raw` when unresolved.
    pub to: String,
    /// Target exactly as written.
    #[serde(rename = "toRaw")]
    pub to_raw: String,
    /// Display text.
    pub text: String,
    /// Whether the target resolves inside the indexed corpus.
    pub internal: bool,
    /// Whether this is an embed/transclusion rather than a navigable
    /// reference.
    pub embed: bool,
}

/// A checklist item extracted from a document.
///
/// The shape is fixed: absent date fields are `null` in serialized form,
/// never omitted, because downstream consumers rely on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub description: String,
    pub checked: bool,
    /// Custom inline fields that are not one of the scheduling attributes.
    #[serde(default)]
    pub metadata: Metadata,
    pub created: Option<NaiveDate>,
    pub due: Option<NaiveDate>,
    pub completion: Option<NaiveDate>,
    pub start: Option<NaiveDate>,
    pub scheduled: Option<NaiveDate>,
    /// Label of the list the task belongs to (nearest enclosing heading).
    pub list: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_serializes_with_explicit_nulls() {
        let task = Task { description: "buy milk".into(), ..Task::default() };
        let json = serde_json::to_value(&task).unwrap();
        let obj = json.as_object().unwrap();
        for key in ["created", "due", "completion", "start", "scheduled", "list"] {
            assert!(obj.contains_key(key), "missing {key}");
            assert!(obj[key].is_null(), "{key} should be null");
        }
        assert_eq!(obj["checked"], serde_json::json!(false));
    }

    #[test]
    fn link_uses_to_raw_wire_name() {
        let link = Link {
            from: "a.md".into(),
            to: "b.md".into(),
            to_raw: "b".into(),
            text: "b".into(),
            internal: true,
            embed: false,
        };
        let json = serde_json::to_value(&link).unwrap();
        assert_eq!(json["toRaw"], serde_json::json!("b"));
    }
}
