use serde::Deserialize;

/// Browser-like user agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Main configuration structure for Site-Scout
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub fetcher: FetcherConfig,
    /// Optional script-capable renderer used as the secondary fetch strategy
    pub renderer: Option<RendererConfig>,
    pub discovery: DiscoveryConfig,
    pub batch: BatchConfig,
    pub competitors: CompetitorConfig,
    pub grounded: GroundedConfig,
}

/// Page fetching configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetcherConfig {
    /// User agent sent with every request
    pub user_agent: String,

    /// Total request timeout (seconds)
    pub request_timeout_secs: u64,

    /// Connection timeout (seconds)
    pub connect_timeout_secs: u64,

    /// Extracted text shorter than this triggers the secondary strategy
    pub min_content_chars: usize,

    /// Whether the plain HTTP strategy is available
    pub http_enabled: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 15,
            connect_timeout_secs: 5,
            min_content_chars: 100,
            http_enabled: true,
        }
    }
}

/// Renderer service configuration (Firecrawl-compatible `/scrape` API)
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RendererConfig {
    /// Base URL of the renderer API, e.g. `http://localhost:3002/v1`
    pub endpoint: String,

    /// Environment variable holding the bearer token, if the service needs one
    pub api_key_env: Option<String>,

    /// Render request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3002/v1".to_string(),
            api_key_env: None,
            timeout_secs: 30,
        }
    }
}

/// URL discovery configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DiscoveryConfig {
    /// Default bound on returned URLs
    pub max_urls: usize,

    /// Upper bound on pages fetched by the crawl fallback
    pub crawl_hard_cap: usize,

    /// Default page limit for a standalone crawl
    pub crawl_limit: usize,

    /// Timeout for each sitemap document request (seconds)
    pub sitemap_timeout_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_urls: 1000,
            crawl_hard_cap: 500,
            crawl_limit: 10,
            sitemap_timeout_secs: 10,
        }
    }
}

/// Batch audit configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BatchConfig {
    /// Default number of pages processed per batch
    pub max_pages: usize,

    /// Content chunks requested per page
    pub max_chunks: usize,

    /// Error messages retained in the result
    pub max_errors: usize,

    /// Successful samples retained in the result
    pub max_samples: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_pages: 40,
            max_chunks: 6,
            max_errors: 10,
            max_samples: 3,
        }
    }
}

/// Competitor discovery configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CompetitorConfig {
    /// Default number of competitors returned
    pub max_results: usize,

    /// Timeout for search-result page requests (seconds)
    pub search_timeout_secs: u64,

    /// Base URL of the DuckDuckGo HTML frontend
    pub duckduckgo_url: String,

    /// Base URL of Bing
    pub bing_url: String,
}

impl Default for CompetitorConfig {
    fn default() -> Self {
        Self {
            max_results: 10,
            search_timeout_secs: 10,
            duckduckgo_url: "https://duckduckgo.com".to_string(),
            bing_url: "https://www.bing.com".to_string(),
        }
    }
}

/// Grounded AI-search configuration (Gemini with Google Search grounding)
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GroundedConfig {
    /// Base URL of the generative language API
    pub endpoint: String,

    /// Model name used for grounded requests
    pub model: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Completion request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for GroundedConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}
