//! Site-Scout: content acquisition and site discovery for marketing-site audits
//!
//! This crate turns a single root URL into normalized page text and a bounded,
//! deduplicated set of same-site URLs, using a layered fallback of discovery
//! strategies (sitemap first, breadth-first crawl second). It also drives batch
//! page analysis and a fallback chain for competitor discovery.

pub mod batch;
pub mod competitors;
pub mod config;
pub mod crawler;
pub mod discovery;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for Site-Scout operations
#[derive(Debug, Error)]
pub enum SurveyError {
    /// A required backend is missing or unavailable. Surfaced to callers as a
    /// client-facing error.
    #[error("Backend not configured: {0}")]
    NotConfigured(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Parse error in {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    #[error("Analysis failed: {0}")]
    Analysis(String),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SurveyError {
    /// Returns true for the "backend not configured" condition
    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured(_))
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Site-Scout operations
pub type Result<T> = std::result::Result<T, SurveyError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use batch::{BatchAuditRunner, BatchResult};
pub use competitors::{CompetitorChain, CompetitorResult};
pub use config::Config;
pub use crawler::{DomainCrawler, PageContent, PageFetcher};
pub use discovery::{DiscoveryResult, DiscoverySource, Lookup, SiteDiscovery, SitemapResolver};
