//! URL extraction from loosely structured crawl output

use crate::url::url_in_scope;
use std::collections::HashSet;

/// Keys whose values are treated as URLs (compared case-insensitively)
pub const URL_KEYS: &[&str] = &["url", "link", "loc", "source", "sourceurl", "pageurl"];

/// A generic tree of scalars, sequences and mappings
#[derive(Debug, Clone, PartialEq)]
pub enum RawNode {
    Scalar(String),
    Sequence(Vec<RawNode>),
    Mapping(Vec<(String, RawNode)>),
}

impl From<serde_json::Value> for RawNode {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => RawNode::Scalar(String::new()),
            Value::Bool(b) => RawNode::Scalar(b.to_string()),
            Value::Number(n) => RawNode::Scalar(n.to_string()),
            Value::String(s) => RawNode::Scalar(s),
            Value::Array(items) => RawNode::Sequence(items.into_iter().map(RawNode::from).collect()),
            Value::Object(map) => RawNode::Mapping(
                map.into_iter()
                    .map(|(key, value)| (key, RawNode::from(value)))
                    .collect(),
            ),
        }
    }
}

fn is_url_key(key: &str) -> bool {
    URL_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

/// Collects in-scope URLs from `node` in first-seen order
///
/// A value is collected when it is a scalar under one of [`URL_KEYS`],
/// starts with `http` and its host is in scope of `root_host`. Collection
/// stops once `max` URLs are found.
///
/// # Examples
///
/// ```
/// use site_scout::discovery::{collect_urls, RawNode};
///
/// let node = RawNode::from(serde_json::json!({
///     "pages": [{"url": "https://example.com/a"}, {"URL": "https://other.com/"}]
/// }));
/// assert_eq!(collect_urls(&node, "example.com", 10), vec!["https://example.com/a"]);
/// ```
pub fn collect_urls(node: &RawNode, root_host: &str, max: usize) -> Vec<String> {
    let mut found = Vec::new();
    let mut seen = HashSet::new();
    if max > 0 {
        walk(node, root_host, max, &mut seen, &mut found);
    }
    found
}

fn walk(
    node: &RawNode,
    root_host: &str,
    max: usize,
    seen: &mut HashSet<String>,
    found: &mut Vec<String>,
) {
    match node {
        RawNode::Scalar(_) => {}
        RawNode::Sequence(items) => {
            for item in items {
                if found.len() >= max {
                    return;
                }
                walk(item, root_host, max, seen, found);
            }
        }
        RawNode::Mapping(entries) => {
            for (key, value) in entries {
                if found.len() >= max {
                    return;
                }
                match value {
                    RawNode::Scalar(text) if is_url_key(key) => {
                        let candidate = text.trim();
                        if candidate.starts_with("http")
                            && url_in_scope(candidate, root_host)
                            && seen.insert(candidate.to_string())
                        {
                            found.push(candidate.to_string());
                        }
                    }
                    _ => walk(value, root_host, max, seen, found),
                }
            }
        }
    }
}
