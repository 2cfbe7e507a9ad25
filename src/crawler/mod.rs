//! Crawler module for page fetching and same-host crawling
//!
//! This module contains the content acquisition logic, including:
//! - Page fetching through a fallback chain of extraction strategies
//! - HTML to markdown conversion and link extraction
//! - The renderer service client
//! - The breadth-first frontier and crawl loop

mod coordinator;
mod fetcher;
mod parser;
mod render;
mod scheduler;

pub use coordinator::{CrawlReport, CrawledPage, DomainCrawler};
pub use fetcher::{
    build_client_with_timeout, build_http_client, FetchStrategy, PageContent, PageFetcher,
    PageSource,
};
pub use parser::{extract_markdown_links, parse_html, ParsedPage};
pub use render::{RenderService, Renderer};
pub use scheduler::Frontier;
