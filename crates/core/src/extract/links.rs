//! Link extraction: wikilinks and markdown links, in document order.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::ParseContext;
use crate::document::Link;

// [[target]], [[target|alias]], ![[embed]]
static WIKILINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(!)?\[\[([^\]|]+)(?:\|([^\]]+))?\]\]").unwrap());

// [text](url), ![alt](asset)
static MARKDOWN_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(!)?\[([^\]]*)\]\(([^)\s]+)\)").unwrap());

/// Extract all links from a document body.
pub fn extract_links(body: &str, ctx: &ParseContext) -> Vec<Link> {
    let mut links = Vec::new();

    for line in super::lines_outside_fences(body) {
        // Gather matches from both patterns with their offsets so a line
        // holding both kinds keeps document order.
        let mut found: Vec<(usize, usize, Link)> = Vec::new();

        for cap in WIKILINK_RE.captures_iter(line) {
            let whole = cap.get(0).unwrap();
            let target = cap.get(2).map(|m| m.as_str()).unwrap_or("").trim();
            let alias = cap.get(3).map(|m| m.as_str().trim());
            let (to, internal) = resolve_wikilink(target, ctx.permalinks);

            found.push((
                whole.start(),
                whole.end(),
                Link {
                    from: ctx.from.to_string(),
                    to,
                    to_raw: target.to_string(),
                    text: alias.unwrap_or(target).to_string(),
                    internal,
                    embed: cap.get(1).is_some(),
                },
            ));
        }

        for cap in MARKDOWN_LINK_RE.captures_iter(line) {
            let whole = cap.get(0).unwrap();
            // Skip anything inside an already-matched wikilink.
            if found.iter().any(|(s, e, _)| whole.start() >= *s && whole.start() < *e) {
                continue;
            }

            let text = cap.get(2).map(|m| m.as_str()).unwrap_or("");
            let url = cap.get(3).map(|m| m.as_str()).unwrap_or("");
            let external = is_external(url);
            let to = if external {
                url.to_string()
            } else {
                resolve_relative(ctx.from, url)
            };

            found.push((
                whole.start(),
                whole.end(),
                Link {
                    from: ctx.from.to_string(),
                    to,
                    to_raw: url.to_string(),
                    text: text.to_string(),
                    internal: !external,
                    embed: cap.get(1).is_some(),
                },
            ));
        }

        found.sort_by_key(|(start, _, _)| *start);
        links.extend(found.into_iter().map(|(_, _, link)| link));
    }

    links
}

fn is_external(url: &str) -> bool {
    url.contains("://") || url.starts_with("mailto:") || url.starts_with("tel:")
}

/// Resolve a wikilink target against the corpus permalinks.
///
/// Unresolved targets keep `to == to_raw` and are marked non-internal.
fn resolve_wikilink(target: &str, permalinks: &[String]) -> (String, bool) {
    let base = target.split('#').next().unwrap_or(target).trim();
    if base.is_empty() {
        // [[#section]] self-reference.
        return (target.to_string(), true);
    }

    match find_permalink(base, permalinks) {
        Some(permalink) => (permalink, true),
        None => (target.to_string(), false),
    }
}

fn find_permalink(base: &str, permalinks: &[String]) -> Option<String> {
    let with_md = format!("{base}.md");
    let with_mdx = format!("{base}.mdx");

    // Prefer an exact relative-path match, with or without extension.
    for p in permalinks {
        if p == base || *p == with_md || *p == with_mdx {
            return Some(p.clone());
        }
    }

    // Fall back to basename / stem match anywhere in the corpus.
    for p in permalinks {
        let path = Path::new(p);
        let stem = path.file_stem().and_then(|s| s.to_str());
        let name = path.file_name().and_then(|s| s.to_str());
        if stem == Some(base) || name == Some(base) {
            return Some(p.clone());
        }
    }

    None
}

/// Join a relative url onto the source document's directory and normalize
/// `.` / `..` components. Anchors and queries are stripped from the
/// resolved form but stay visible in `to_raw`.
fn resolve_relative(from: &str, url: &str) -> String {
    let url = url.split(['#', '?']).next().unwrap_or(url);
    if url.is_empty() {
        return from.to_string();
    }

    let base = Path::new(from).parent().unwrap_or_else(|| Path::new(""));

    let mut parts: Vec<&str> = Vec::new();
    let joined = base.to_string_lossy();
    for part in joined.split('/').chain(url.split('/')) {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}
