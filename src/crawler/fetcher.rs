//! Page fetcher implementation
//!
//! This module turns one URL into normalized page text, including:
//! - Building HTTP clients with the configured user agent and timeouts
//! - The primary strategy: GET, parse, strip boilerplate, convert to markdown
//! - The secondary strategy: a script-capable renderer service, if configured
//! - Folding every outcome into a tagged [`PageContent`] instead of an error

use crate::config::{Config, FetcherConfig};
use crate::crawler::parser::{extract_markdown_links, parse_html, ParsedPage};
use crate::crawler::render::{RenderService, Renderer};
use crate::{Result, SurveyError};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect::Policy, Client};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Strategy that produced a page's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStrategy {
    /// Plain HTTP GET plus markup conversion
    Http,
    /// Script-capable renderer service
    Render,
    /// No strategy was available
    None,
}

impl FetchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Render => "render",
            Self::None => "none",
        }
    }
}

impl fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of fetching one page
///
/// Fetching never fails with an error; failures are reported through `ok`
/// and `error` with empty `markdown`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContent {
    pub url: String,
    pub markdown: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub via: FetchStrategy,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Absolute links found by the strategy that produced the text
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
}

impl PageContent {
    /// Builds a successful result from extracted page data
    pub fn from_parsed(url: impl Into<String>, via: FetchStrategy, parsed: ParsedPage) -> Self {
        Self {
            url: url.into(),
            markdown: parsed.markdown,
            title: parsed.title,
            description: parsed.description,
            via,
            ok: true,
            error: None,
            links: parsed.links,
        }
    }

    /// Builds a failed result
    pub fn failed(url: impl Into<String>, via: FetchStrategy, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            markdown: String::new(),
            title: None,
            description: None,
            via,
            ok: false,
            error: Some(error.into()),
            links: Vec::new(),
        }
    }

    /// Length of the extracted text in characters
    pub fn text_len(&self) -> usize {
        self.markdown.chars().count()
    }
}

/// Anything that can turn a URL into page content
///
/// [`PageFetcher`] is the production implementation; crawls and batch runs
/// take an `Arc<dyn PageSource>` so they can be driven by other backends.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches one page; never fails, see [`PageContent::ok`]
    async fn fetch(&self, url: &str) -> PageContent;

    /// Returns false when no fetch backend is configured at all
    fn has_backend(&self) -> bool {
        true
    }

    /// The strategy tried first
    fn primary_strategy(&self) -> FetchStrategy {
        FetchStrategy::Http
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed (up to 10 hops); every request is bounded by the
/// configured total and connect timeouts.
pub fn build_http_client(config: &FetcherConfig) -> std::result::Result<Client, reqwest::Error> {
    build_client_with_timeout(config, Duration::from_secs(config.request_timeout_secs))
}

/// Builds an HTTP client sharing the fetcher settings but with its own total timeout
pub fn build_client_with_timeout(
    config: &FetcherConfig,
    timeout: Duration,
) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages through a fallback chain of extraction strategies
///
/// # Strategy Order
///
/// 1. HTTP GET + markup conversion (if enabled)
/// 2. Renderer service (if configured), when step 1 failed outright or
///    produced less than `min_content_chars` characters
///
/// The first strategy yielding non-trivial content wins. Short but non-empty
/// HTTP text is still returned when the renderer fails or is absent.
#[derive(Clone)]
pub struct PageFetcher {
    client: Option<Client>,
    renderer: Option<Arc<dyn Renderer>>,
    min_content_chars: usize,
}

impl PageFetcher {
    /// Creates a fetcher from its parts
    ///
    /// `client` is the HTTP strategy; pass `None` to disable it.
    pub fn new(
        client: Option<Client>,
        renderer: Option<Arc<dyn Renderer>>,
        min_content_chars: usize,
    ) -> Self {
        Self {
            client,
            renderer,
            min_content_chars,
        }
    }

    /// Creates a fetcher from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(PageFetcher)` - Fetcher with the configured strategies. A
    ///   renderer whose API key variable is unset is left out.
    /// * `Err(SurveyError)` - The HTTP client or renderer could not be built
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = if config.fetcher.http_enabled {
            Some(build_http_client(&config.fetcher)?)
        } else {
            None
        };

        let renderer = match config
            .renderer
            .as_ref()
            .map(|renderer| RenderService::from_config(renderer, &config.fetcher))
        {
            Some(Ok(service)) => Some(Arc::new(service) as Arc<dyn Renderer>),
            Some(Err(e)) if e.is_not_configured() => {
                tracing::warn!("Renderer disabled: {}", e);
                None
            }
            Some(Err(e)) => return Err(e),
            None => None,
        };

        Ok(Self::new(client, renderer, config.fetcher.min_content_chars))
    }

    /// Runs the HTTP strategy
    async fn fetch_http(&self, client: &Client, url: &str) -> Result<ParsedPage> {
        let base_url = Url::parse(url)?;
        let response = client.get(base_url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SurveyError::Fetch {
                url: url.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        // Relative links resolve against the final URL after redirects
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        let body = response.text().await?;

        if content_type.is_empty() || content_type.contains("html") || content_type.contains("xml")
        {
            Ok(parse_html(&body, &final_url, self.min_content_chars))
        } else if content_type.starts_with("text/") {
            Ok(ParsedPage {
                markdown: body.trim().to_string(),
                ..ParsedPage::default()
            })
        } else {
            Err(SurveyError::Fetch {
                url: url.to_string(),
                message: format!("unsupported content type '{}'", content_type),
            })
        }
    }

    fn is_substantial(&self, page: &ParsedPage) -> bool {
        let len = page.markdown.trim().chars().count();
        len > 0 && len >= self.min_content_chars
    }
}

/// Links for a rendered page that came without a link list
///
/// Prefers the anchors of the short HTTP page, then inline markdown links.
fn fallback_links(url: &str, markdown: &str, http_page: Option<ParsedPage>) -> Vec<String> {
    match http_page {
        Some(page) if !page.links.is_empty() => page.links,
        _ => Url::parse(url)
            .map(|base_url| extract_markdown_links(markdown, &base_url))
            .unwrap_or_default(),
    }
}

#[async_trait]
impl PageSource for PageFetcher {
    async fn fetch(&self, url: &str) -> PageContent {
        if !self.has_backend() {
            return PageContent::failed(url, FetchStrategy::None, "no fetch backend configured");
        }

        let mut errors: Vec<String> = Vec::new();
        let mut short_page: Option<ParsedPage> = None;

        if let Some(client) = &self.client {
            match self.fetch_http(client, url).await {
                Ok(page) if self.is_substantial(&page) => {
                    return PageContent::from_parsed(url, FetchStrategy::Http, page);
                }
                Ok(page) if !page.markdown.trim().is_empty() => {
                    tracing::debug!(
                        "HTTP text for {} is short ({} chars)",
                        url,
                        page.markdown.chars().count()
                    );
                    short_page = Some(page);
                }
                Ok(_) => errors.push("http: empty content".to_string()),
                Err(e) => {
                    tracing::debug!("HTTP strategy failed for {}: {}", url, e);
                    errors.push(format!("http: {}", e));
                }
            }
        }

        if let Some(renderer) = &self.renderer {
            match renderer.render(url).await {
                Ok(mut page) => {
                    let render_len = page.markdown.trim().chars().count();
                    let short_len = short_page
                        .as_ref()
                        .map_or(0, |p| p.markdown.trim().chars().count());

                    if render_len > 0 && (self.is_substantial(&page) || render_len > short_len) {
                        if page.links.is_empty() {
                            page.links = fallback_links(url, &page.markdown, short_page);
                        }
                        return PageContent::from_parsed(url, FetchStrategy::Render, page);
                    }
                    errors.push(format!("{}: empty content", renderer.name()));
                }
                Err(e) => {
                    tracing::debug!("Renderer failed for {}: {}", url, e);
                    errors.push(format!("{}: {}", renderer.name(), e));
                }
            }
        }

        if let Some(page) = short_page {
            return PageContent::from_parsed(url, FetchStrategy::Http, page);
        }

        let via = if self.renderer.is_some() {
            FetchStrategy::Render
        } else {
            FetchStrategy::Http
        };
        PageContent::failed(url, via, errors.join("; "))
    }

    fn has_backend(&self) -> bool {
        self.client.is_some() || self.renderer.is_some()
    }

    fn primary_strategy(&self) -> FetchStrategy {
        if self.client.is_some() {
            FetchStrategy::Http
        } else if self.renderer.is_some() {
            FetchStrategy::Render
        } else {
            FetchStrategy::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetcherConfig;

    struct StaticRenderer {
        markdown: &'static str,
    }

    #[async_trait]
    impl Renderer for StaticRenderer {
        fn name(&self) -> &str {
            "static"
        }

        async fn render(&self, _url: &str) -> Result<ParsedPage> {
            Ok(ParsedPage {
                markdown: self.markdown.to_string(),
                title: Some("Rendered".to_string()),
                ..ParsedPage::default()
            })
        }
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&FetcherConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_strategy_tags() {
        assert_eq!(FetchStrategy::Http.as_str(), "http");
        assert_eq!(
            serde_json::to_string(&FetchStrategy::Render).unwrap(),
            "\"render\""
        );
    }

    #[test]
    fn test_page_content_serialization_shape() {
        let page = PageContent::failed("https://example.com/", FetchStrategy::Http, "HTTP 500");
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["ok"], false);
        assert_eq!(value["via"], "http");
        assert_eq!(value["markdown"], "");
        assert_eq!(value["error"], "HTTP 500");
        assert!(value.get("links").is_none());
        assert!(value.get("title").is_none());
    }

    #[test]
    fn test_renderer_without_key_is_dropped() {
        let config = crate::config::parse_config(
            "[renderer]\nendpoint = \"http://localhost:3002/v1\"\napi-key-env = \"SITE_SCOUT_TEST_UNSET_RENDER_KEY\"\n",
        )
        .unwrap();

        let fetcher = PageFetcher::from_config(&config).unwrap();
        assert!(fetcher.renderer.is_none());
        assert!(fetcher.has_backend());
        assert_eq!(fetcher.primary_strategy(), FetchStrategy::Http);
    }

    #[tokio::test]
    async fn test_no_backend() {
        let fetcher = PageFetcher::new(None, None, 100);
        assert!(!fetcher.has_backend());
        assert_eq!(fetcher.primary_strategy(), FetchStrategy::None);

        let page = fetcher.fetch("https://example.com/").await;
        assert!(!page.ok);
        assert_eq!(page.via, FetchStrategy::None);
        assert!(page.error.unwrap().contains("no fetch backend"));
    }

    #[tokio::test]
    async fn test_renderer_only() {
        let renderer = Arc::new(StaticRenderer {
            markdown: "# Rendered page",
        });
        let fetcher = PageFetcher::new(None, Some(renderer), 5);
        assert_eq!(fetcher.primary_strategy(), FetchStrategy::Render);

        let page = fetcher.fetch("https://example.com/").await;
        assert!(page.ok);
        assert_eq!(page.via, FetchStrategy::Render);
        assert_eq!(page.markdown, "# Rendered page");
        assert_eq!(page.title.as_deref(), Some("Rendered"));
    }

    #[tokio::test]
    async fn test_renderer_empty_output_fails() {
        let renderer = Arc::new(StaticRenderer { markdown: "   " });
        let fetcher = PageFetcher::new(None, Some(renderer), 5);

        let page = fetcher.fetch("https://example.com/").await;
        assert!(!page.ok);
        assert_eq!(page.via, FetchStrategy::Render);
        assert!(page.markdown.is_empty());
    }
}
