//! Per-page analysis capabilities
//!
//! Two independent capabilities run on every fetched page: question/answer
//! content chunks, and structured contact data (name, address, phone).
//! [`HeuristicAnalyzer`] implements both locally from the page markdown.

use crate::crawler::PageContent;
use crate::{Result, SurveyError};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Upper bound on words in a chunk answer
pub const MAX_ANSWER_WORDS: usize = 50;

/// A question with a short, direct answer taken from page content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentChunk {
    pub question: String,
    pub answer: String,
}

/// Name, address and phone of the business behind a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactData {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

#[async_trait]
pub trait ChunkExtractor: Send + Sync {
    /// Extracts at most `max_chunks` chunks from a page
    async fn extract_chunks(&self, page: &PageContent, max_chunks: usize)
        -> Result<Vec<ContentChunk>>;
}

#[async_trait]
pub trait ContactExtractor: Send + Sync {
    /// Extracts contact data, or `None` when the page carries none
    async fn extract_contact(&self, page: &PageContent) -> Result<Option<ContactData>>;
}

/// Regex and heading based implementation of both capabilities
#[derive(Debug, Clone)]
pub struct HeuristicAnalyzer {
    phone: Regex,
    address: Regex,
}

impl HeuristicAnalyzer {
    pub fn new() -> Result<Self> {
        let phone = Regex::new(r"(?:\+\d{1,3}[\s.-]?)?(?:\(\d{3}\)|\d{3})[\s.-]?\d{3}[\s.-]\d{4}")
            .map_err(|e| SurveyError::Analysis(format!("phone pattern: {}", e)))?;
        let address = Regex::new(
            r"\b\d{1,5}(?:\s+[A-Z][A-Za-z0-9.'-]*){1,4}\s+(?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Lane|Ln|Drive|Dr|Way|Court|Ct|Place|Pl|Parkway|Pkwy)\b\.?(?:,\s*[A-Z][A-Za-z.'-]*(?:\s[A-Z][A-Za-z.'-]*)*)*(?:,?\s+(?:[A-Z]{2}\s+)?\d{5}(?:-\d{4})?)?",
        )
        .map_err(|e| SurveyError::Analysis(format!("address pattern: {}", e)))?;

        Ok(Self { phone, address })
    }
}

/// Returns the heading text when `line` is a markdown heading
fn heading_text(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.starts_with(' ') {
        return None;
    }
    let text = rest.trim();
    (!text.is_empty()).then_some(text)
}

fn to_question(heading: &str) -> String {
    let heading = heading.trim_end_matches(|c: char| c == ':' || c == '.');
    if heading.ends_with('?') {
        heading.to_string()
    } else {
        format!("What is {}?", heading)
    }
}

fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strips list and quote markers from a body line
fn body_text(line: &str) -> &str {
    let line = line.trim();
    line.strip_prefix("- ")
        .or_else(|| line.strip_prefix("> "))
        .unwrap_or(line)
        .trim()
}

/// Splits markdown into `(heading, body)` sections with non-empty bodies
fn sections(markdown: &str) -> Vec<(String, String)> {
    let mut sections = Vec::new();
    let mut current: Option<(String, Vec<String>)> = None;

    for line in markdown.lines() {
        if let Some(heading) = heading_text(line) {
            if let Some((h, body)) = current.take() {
                sections.push((h, body.join(" ")));
            }
            current = Some((heading.to_string(), Vec::new()));
            continue;
        }

        let text = body_text(line);
        if text.is_empty() || text.starts_with("```") {
            continue;
        }
        if let Some((_, body)) = current.as_mut() {
            body.push(text.to_string());
        }
    }
    if let Some((h, body)) = current {
        sections.push((h, body.join(" ")));
    }

    sections.retain(|(_, body)| !body.trim().is_empty());
    sections
}

#[async_trait]
impl ChunkExtractor for HeuristicAnalyzer {
    async fn extract_chunks(
        &self,
        page: &PageContent,
        max_chunks: usize,
    ) -> Result<Vec<ContentChunk>> {
        Ok(sections(&page.markdown)
            .into_iter()
            .take(max_chunks)
            .map(|(heading, body)| ContentChunk {
                question: to_question(&heading),
                answer: truncate_words(&body, MAX_ANSWER_WORDS),
            })
            .collect())
    }
}

#[async_trait]
impl ContactExtractor for HeuristicAnalyzer {
    async fn extract_contact(&self, page: &PageContent) -> Result<Option<ContactData>> {
        let phone = self
            .phone
            .find(&page.markdown)
            .map(|m| m.as_str().trim().to_string());
        let address = self
            .address
            .find(&page.markdown)
            .map(|m| m.as_str().trim().trim_end_matches(',').to_string());

        if phone.is_none() && address.is_none() {
            return Ok(None);
        }

        let name = page
            .markdown
            .lines()
            .find_map(heading_text)
            .map(str::to_string)
            .or_else(|| page.title.clone());

        Ok(Some(ContactData {
            name,
            address,
            phone,
        }))
    }
}
