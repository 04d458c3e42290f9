//! Owned document tree built from the comrak AST.
//!
//! The arena-backed comrak nodes are traversed once and reduced to an owned
//! structure that can outlive the parse and be handed to computed-field
//! functions. Callers other than the extractor treat it as opaque.

use comrak::nodes::{AstNode, NodeValue};
use comrak::{parse_document, Arena, Options};

/// Parsed view of a document body.
#[derive(Debug, Clone, Default)]
pub struct DocumentAst {
    /// Markdown body with front matter stripped.
    pub body: String,
    /// Headings in document order.
    pub headings: Vec<Heading>,
    /// Checklist items in document order.
    pub task_items: Vec<TaskItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

/// A raw checklist item; task field parsing happens in [`super::tasks`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub checked: bool,
    pub text: String,
    /// Nearest heading above the item, if any.
    pub heading: Option<String>,
}

impl DocumentAst {
    /// Parse a markdown body (front matter already stripped).
    pub fn parse(body: &str) -> Self {
        let arena = Arena::new();
        let mut options = Options::default();
        options.extension.tasklist = true;

        let root = parse_document(&arena, body, &options);

        let mut ast = DocumentAst { body: body.to_string(), ..DocumentAst::default() };
        let mut current_heading: Option<String> = None;
        collect(root, &mut current_heading, &mut ast);
        ast
    }

    /// Text of the first top-level heading, if any.
    pub fn first_heading(&self) -> Option<&str> {
        self.headings.first().map(|h| h.text.as_str())
    }
}

fn collect<'a>(
    node: &'a AstNode<'a>,
    current_heading: &mut Option<String>,
    out: &mut DocumentAst,
) {
    for child in node.children() {
        enum Kind {
            Heading(u8),
            Task(bool),
            Other,
        }

        let kind = match &child.data.borrow().value {
            NodeValue::Heading(h) => Kind::Heading(h.level),
            NodeValue::TaskItem(symbol) => Kind::Task(symbol.is_some()),
            _ => Kind::Other,
        };

        match kind {
            Kind::Heading(level) => {
                let text = collect_text(child);
                *current_heading = Some(text.clone());
                out.headings.push(Heading { level, text });
            }
            Kind::Task(checked) => {
                let text = first_paragraph_text(child);
                out.task_items.push(TaskItem {
                    checked,
                    text,
                    heading: current_heading.clone(),
                });
                // Nested checklists live under the item.
                collect(child, current_heading, out);
            }
            Kind::Other => collect(child, current_heading, out),
        }
    }
}

fn first_paragraph_text<'a>(item: &'a AstNode<'a>) -> String {
    item.children()
        .find(|c| matches!(c.data.borrow().value, NodeValue::Paragraph))
        .map(collect_text)
        .unwrap_or_default()
}

fn collect_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut text = String::new();
    collect_text_into(node, &mut text);
    text.trim().to_string()
}

fn collect_text_into<'a>(node: &'a AstNode<'a>, out: &mut String) {
    for child in node.children() {
        {
            let value = &child.data.borrow().value;
            match value {
                NodeValue::Text(t) => out.push_str(t),
                NodeValue::Code(c) => out.push_str(&c.literal),
                NodeValue::SoftBreak | NodeValue::LineBreak => out.push(' '),
                _ => {}
            }
        }
        collect_text_into(child, out);
    }
}
