//! Task construction from checklist items.
//!
//! Inline `[key:: value]` fields and emoji shorthands are parsed off the
//! item text; known scheduling keys fill the fixed date slots, everything
//! else lands in the task's metadata map.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::ast::TaskItem;
use crate::document::types::Metadata;
use crate::document::Task;

static FIELD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([A-Za-z][A-Za-z0-9_-]*)::\s*([^\]]*)\]").unwrap());

static EMOJI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(➕|📅|✅|🛫|⏳)\s*(\d{4}-\d{2}-\d{2})").unwrap());

pub fn from_items(items: &[TaskItem]) -> Vec<Task> {
    items.iter().map(from_item).collect()
}

fn from_item(item: &TaskItem) -> Task {
    let mut task = Task {
        checked: item.checked,
        list: item.heading.clone(),
        ..Task::default()
    };

    for cap in FIELD_RE.captures_iter(&item.text) {
        let key = cap[1].to_lowercase();
        let value = cap[2].trim().to_string();
        apply_field(&mut task, &key, &value);
    }
    let stripped = FIELD_RE.replace_all(&item.text, "").into_owned();

    for cap in EMOJI_RE.captures_iter(&stripped) {
        let key = match &cap[1] {
            "➕" => "created",
            "📅" => "due",
            "✅" => "completion",
            "🛫" => "start",
            "⏳" => "scheduled",
            _ => continue,
        };
        apply_field(&mut task, key, &cap[2]);
    }
    let description = EMOJI_RE.replace_all(&stripped, "").into_owned();

    task.description = collapse_whitespace(&description);
    task
}

fn apply_field(task: &mut Task, key: &str, value: &str) {
    let slot = match key {
        "created" => Some(&mut task.created),
        "due" => Some(&mut task.due),
        "completion" => Some(&mut task.completion),
        "start" => Some(&mut task.start),
        "scheduled" => Some(&mut task.scheduled),
        _ => None,
    };

    match slot {
        Some(slot) => match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            Ok(date) => *slot = Some(date),
            // Unparseable dates are preserved as custom metadata rather
            // than dropped.
            Err(_) => insert_meta(&mut task.metadata, key, value),
        },
        None => insert_meta(&mut task.metadata, key, value),
    }
}

fn insert_meta(metadata: &mut Metadata, key: &str, value: &str) {
    metadata.insert(key.to_string(), serde_json::Value::String(value.to_string()));
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
