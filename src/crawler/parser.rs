//! HTML parser for extracting page text, links and metadata
//!
//! This module turns raw markup into:
//! - A markdown-like rendering of the main content (boilerplate removed)
//! - Page title and meta description
//! - Links to follow (from <a> tags and canonical links, or markdown links)

use crate::url::resolve_link;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements whose content never counts as page text
const BOILERPLATE_TAGS: &[&str] = &[
    "nav", "header", "footer", "aside", "script", "style", "noscript", "form", "svg", "iframe",
    "template",
];

/// Block elements converted to markdown
const BLOCK_TAGS: &[&str] = &[
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "p",
    "li",
    "blockquote",
    "pre",
];

/// Extracted information from a page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// The meta description
    pub description: Option<String>,

    /// Markdown-like text of the main content
    pub markdown: String,

    /// All links found on the page (absolute URLs, fragments removed, deduplicated)
    pub links: Vec<String>,
}

/// Parses HTML content into text, metadata and links
///
/// # Text Extraction
///
/// Headings become `#`-prefixed lines, list items `- ` lines, blockquotes
/// `> ` lines; paragraphs are kept as plain blocks. Content inside navigation,
/// header, footer, aside, script, style and form elements is dropped. When the
/// structured rendering is shorter than `min_chars`, the plain visible text
/// of the body is used instead if it is longer.
///
/// # Link Extraction Rules
///
/// **Include:** `<a href>` tags and `<link rel="canonical">`.
///
/// **Exclude:** `<a download>`, `javascript:`, `mailto:`, `tel:`, data URIs,
/// fragment-only links and non-HTTP(S) targets.
///
/// # Example
///
/// ```
/// use site_scout::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><h2>Pricing</h2><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url, 0);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert!(parsed.markdown.contains("## Pricing"));
/// assert_eq!(parsed.links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn parse_html(html: &str, base_url: &Url, min_chars: usize) -> ParsedPage {
    let document = Html::parse_document(html);

    let title = extract_title(&document);
    let description = extract_description(&document);

    let mut markdown = structured_markdown(&document, title.as_deref());
    if markdown.chars().count() < min_chars {
        let plain = plain_text(&document);
        if plain.chars().count() > markdown.chars().count() {
            markdown = plain;
        }
    }

    let links = extract_links(&document, base_url);

    ParsedPage {
        title,
        description,
        markdown,
        links,
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

/// Extracts the meta description, falling back to the Open Graph description
fn extract_description(document: &Html) -> Option<String> {
    ["meta[name='description']", "meta[property='og:description']"]
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| {
            document
                .select(&selector)
                .filter_map(|element| element.value().attr("content"))
                .map(collapse_whitespace)
                .find(|s| !s.is_empty())
        })
}

/// Renders block elements outside boilerplate as markdown
fn structured_markdown(document: &Html, title: Option<&str>) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(title) = title {
        parts.push(format!("# {}", title));
    }

    let Ok(selector) = Selector::parse(&BLOCK_TAGS.join(", ")) else {
        return parts.join("\n\n");
    };

    for element in document.select(&selector) {
        // Nested blocks are covered by the text of their outermost block
        if has_ancestor(&element, BOILERPLATE_TAGS) || has_ancestor(&element, BLOCK_TAGS) {
            continue;
        }

        let name = element.value().name();
        if name == "pre" {
            let code = visible_text(element);
            let code = code.trim();
            if !code.is_empty() {
                parts.push(format!("```\n{}\n```", code));
            }
            continue;
        }

        let text = collapse_whitespace(&visible_text(element));
        if text.is_empty() {
            continue;
        }

        let block = match name {
            "h1" => format!("# {}", text),
            "h2" => format!("## {}", text),
            "h3" => format!("### {}", text),
            "h4" => format!("#### {}", text),
            "h5" => format!("##### {}", text),
            "h6" => format!("###### {}", text),
            "li" => format!("- {}", text),
            "blockquote" => format!("> {}", text),
            _ => text,
        };
        parts.push(block);
    }

    parts.join("\n\n").trim().to_string()
}

/// Visible text of the whole body, whitespace collapsed
fn plain_text(document: &Html) -> String {
    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    collapse_whitespace(&visible_text(body))
}

/// Concatenates text nodes below `root` that are not inside boilerplate
fn visible_text(root: ElementRef<'_>) -> String {
    let mut out = String::new();

    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node
            .ancestors()
            .take_while(|ancestor| ancestor.id() != root.id())
            .any(|ancestor| is_boilerplate(ancestor.value()));

        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }

    out
}

fn is_boilerplate(node: &Node) -> bool {
    node.as_element()
        .map_or(false, |element| BOILERPLATE_TAGS.contains(&element.name()))
}

fn has_ancestor(element: &ElementRef<'_>, tags: &[&str]) -> bool {
    element.ancestors().any(|ancestor| {
        ancestor
            .value()
            .as_element()
            .map_or(false, |e| tags.contains(&e.name()))
    })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extracts all valid links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(base_url, href) {
                    if seen.insert(absolute_url.clone()) {
                        links.push(absolute_url);
                    }
                }
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(base_url, href) {
                    if seen.insert(absolute_url.clone()) {
                        links.push(absolute_url);
                    }
                }
            }
        }
    }

    links
}

/// Extracts inline link targets (`[text](href)`) from markdown
///
/// Image embeds (`![alt](src)`) are skipped. Targets are resolved against
/// `base_url` with the same filtering as HTML links.
pub fn extract_markdown_links(markdown: &str, base_url: &Url) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for (start, _) in markdown.match_indices("](") {
        let is_image = markdown[..start]
            .rfind('[')
            .map_or(false, |open| markdown[..open].ends_with('!'));
        if is_image {
            continue;
        }

        let rest = &markdown[start + 2..];
        let end = rest
            .find(|c: char| c == ')' || c.is_whitespace())
            .unwrap_or(rest.len());
        let href = rest[..end].trim_start_matches('<').trim_end_matches('>');

        if let Some(absolute_url) = resolve_link(base_url, href) {
            if seen.insert(absolute_url.clone()) {
                links.push(absolute_url);
            }
        }
    }

    links
}
