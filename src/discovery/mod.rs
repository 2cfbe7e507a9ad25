//! Site URL discovery
//!
//! Discovery turns a root URL into a bounded, deduplicated list of same-site
//! URLs. The sitemap is tried first; a breadth-first crawl is the fallback.

mod orchestrator;
mod sitemap;
mod walker;

pub use orchestrator::SiteDiscovery;
pub use sitemap::{parse_sitemap, SitemapDocument, SitemapResolver};
pub use walker::{collect_urls, RawNode, URL_KEYS};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one discovery source
///
/// `Empty` means the source worked but had nothing to offer; `Failed` means
/// it could not be used at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    Empty,
    Failed(String),
}

impl<T> Lookup<T> {
    /// Converts to an Option, dropping the reason for a failure
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::Empty | Self::Failed(_) => None,
        }
    }
}

impl<T: Default> Lookup<T> {
    /// The found value, or the default for both non-found outcomes
    pub fn unwrap_or_default(self) -> T {
        self.found().unwrap_or_default()
    }
}

/// Which source produced a discovery result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoverySource {
    Sitemap,
    Crawl,
}

impl fmt::Display for DiscoverySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sitemap => f.write_str("sitemap"),
            Self::Crawl => f.write_str("crawl"),
        }
    }
}

/// URLs discovered for a site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryResult {
    /// Normalized root URL
    pub root: String,

    /// `urls.len()`, or the number of crawled pages when the crawl yielded
    /// no usable URLs
    pub count: usize,

    pub urls: Vec<String>,

    pub source: DiscoverySource,
}
