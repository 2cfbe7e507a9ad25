//! Markdown report generation
//!
//! This module renders operation results as human-readable markdown,
//! including counts, URL lists, errors, and samples.

use crate::batch::BatchResult;
use crate::competitors::CompetitorResult;
use crate::crawler::{CrawlReport, PageContent};
use crate::discovery::DiscoveryResult;
use chrono::Utc;

/// Longest page excerpt included in a report, in characters
const EXCERPT_CHARS: usize = 500;

/// A result that can be rendered as a markdown report
pub trait MarkdownReport {
    fn to_markdown(&self) -> String;
}

fn header(md: &mut String, title: &str) {
    md.push_str(&format!("# {}\n\n", title));
    md.push_str(&format!(
        "*Generated by Site-Scout at {}*\n\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
}

fn excerpt(text: &str) -> String {
    let mut out: String = text.chars().take(EXCERPT_CHARS).collect();
    if text.chars().count() > EXCERPT_CHARS {
        out.push_str("...");
    }
    out
}

fn url_list(md: &mut String, urls: &[String]) {
    if urls.is_empty() {
        md.push_str("*None*\n\n");
        return;
    }
    for (i, url) in urls.iter().enumerate() {
        md.push_str(&format!("{}. {}\n", i + 1, url));
    }
    md.push('\n');
}

impl MarkdownReport for PageContent {
    fn to_markdown(&self) -> String {
        let mut md = String::new();
        header(&mut md, "Page Content");

        md.push_str(&format!("- **URL**: {}\n", self.url));
        md.push_str(&format!("- **Strategy**: {}\n", self.via));
        md.push_str(&format!("- **OK**: {}\n", self.ok));
        if let Some(title) = &self.title {
            md.push_str(&format!("- **Title**: {}\n", title));
        }
        if let Some(description) = &self.description {
            md.push_str(&format!("- **Description**: {}\n", description));
        }
        if let Some(error) = &self.error {
            md.push_str(&format!("- **Error**: {}\n", error));
        }
        md.push_str(&format!("- **Links Found**: {}\n\n", self.links.len()));

        if !self.markdown.is_empty() {
            md.push_str("## Content\n\n");
            md.push_str(&self.markdown);
            md.push_str("\n\n");
        }

        md
    }
}

impl MarkdownReport for DiscoveryResult {
    fn to_markdown(&self) -> String {
        let mut md = String::new();
        header(&mut md, "URL Discovery");

        md.push_str(&format!("- **Root**: {}\n", self.root));
        md.push_str(&format!("- **Source**: {}\n", self.source));
        md.push_str(&format!("- **Count**: {}\n\n", self.count));

        md.push_str("## URLs\n\n");
        url_list(&mut md, &self.urls);
        md
    }
}

impl MarkdownReport for CrawlReport {
    fn to_markdown(&self) -> String {
        let mut md = String::new();
        header(&mut md, "Crawl Report");

        md.push_str(&format!("- **Seed**: {}\n", self.seed));
        md.push_str(&format!("- **Pages**: {}\n", self.count));
        md.push_str(&format!("- **URLs Visited**: {}\n", self.visited));
        md.push_str(&format!("- **Strategy**: {}\n\n", self.strategy));

        for page in &self.pages {
            md.push_str(&format!(
                "## {}\n\n",
                page.title.as_deref().unwrap_or(page.url.as_str())
            ));
            md.push_str(&format!("<{}>\n\n", page.url));
            md.push_str(&excerpt(&page.markdown));
            md.push_str("\n\n");
        }

        md
    }
}

impl MarkdownReport for BatchResult {
    fn to_markdown(&self) -> String {
        let mut md = String::new();
        header(&mut md, "Batch Audit");

        md.push_str("## Overview\n\n");
        md.push_str(&format!("- **Root**: {}\n", self.root));
        md.push_str(&format!("- **Discovered**: {}\n", self.total_discovered));
        md.push_str(&format!("- **Processed**: {}\n", self.processed));
        md.push_str(&format!(
            "- **Pages With Chunks**: {}\n",
            self.per_capability_success_counts.content_chunks
        ));
        md.push_str(&format!(
            "- **Pages With Contact Data**: {}\n",
            self.per_capability_success_counts.contact_data
        ));
        md.push_str(&format!("- **Errors**: {}\n\n", self.errors_count));

        if !self.errors.is_empty() {
            md.push_str("## Errors\n\n");
            for error in &self.errors {
                md.push_str(&format!("- {}\n", error));
            }
            if self.errors_count > self.errors.len() {
                md.push_str(&format!(
                    "- *...and {} more*\n",
                    self.errors_count - self.errors.len()
                ));
            }
            md.push('\n');
        }

        if !self.samples.is_empty() {
            md.push_str("## Samples\n\n");
            for sample in &self.samples {
                md.push_str(&format!("### {}\n\n", sample.url));
                for chunk in &sample.chunks_preview {
                    md.push_str(&format!("- **{}** {}\n", chunk.question, chunk.answer));
                }
                if let Some(contact) = &sample.contact {
                    md.push_str("\n| Name | Address | Phone |\n");
                    md.push_str("|------|---------|-------|\n");
                    md.push_str(&format!(
                        "| {} | {} | {} |\n",
                        contact.name.as_deref().unwrap_or("-"),
                        contact.address.as_deref().unwrap_or("-"),
                        contact.phone.as_deref().unwrap_or("-")
                    ));
                }
                md.push('\n');
            }
        }

        md
    }
}

impl MarkdownReport for CompetitorResult {
    fn to_markdown(&self) -> String {
        let mut md = String::new();
        header(&mut md, "Competitors");

        if self.competitors.is_empty() {
            md.push_str("*No competitors found*\n\n");
        } else {
            md.push_str("| Name | URL | Description | Relevance |\n");
            md.push_str("|------|-----|-------------|-----------|\n");
            for c in &self.competitors {
                md.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    c.name, c.url, c.description, c.relevance
                ));
            }
            md.push('\n');
        }

        if !self.search_queries.is_empty() {
            md.push_str("## Search Queries\n\n");
            for query in &self.search_queries {
                md.push_str(&format!("- {}\n", query));
            }
            md.push('\n');
        }

        if !self.citations.is_empty() {
            md.push_str("## Citations\n\n");
            for citation in &self.citations {
                md.push_str(&format!("- [{}]({})\n", citation.title, citation.url));
            }
            md.push('\n');
        }

        md
    }
}
