//! Client for a script-capable page rendering service
//!
//! The service speaks the Firecrawl-style `/scrape` protocol: a POST with the
//! target URL and the requested formats, answered with markdown, links and
//! page metadata.

use crate::config::{FetcherConfig, RendererConfig};
use crate::crawler::fetcher::build_client_with_timeout;
use crate::crawler::parser::ParsedPage;
use crate::url::resolve_link;
use crate::{Result, SurveyError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// A heavier page extraction backend used when plain HTTP falls short
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Short name used in error messages
    fn name(&self) -> &str;

    /// Renders a page and returns its text, metadata and links
    async fn render(&self, url: &str) -> Result<ParsedPage>;
}

#[derive(Debug, Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: [&'static str; 2],
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScrapeResponse {
    success: bool,
    data: Option<ScrapeData>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScrapeData {
    markdown: Option<String>,
    links: RenderedLinks,
    metadata: ScrapeMetadata,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScrapeMetadata {
    title: Option<String>,
    description: Option<String>,
}

/// Link lists come back in several shapes depending on the service version
#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum RenderedLinks {
    List(Vec<LinkEntry>),
    Grouped {
        #[serde(default)]
        internal: Vec<LinkEntry>,
        #[serde(default)]
        external: Vec<LinkEntry>,
    },
    #[default]
    None,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LinkEntry {
    Href(String),
    Object {
        #[serde(alias = "url")]
        href: String,
    },
}

impl LinkEntry {
    fn href(&self) -> &str {
        match self {
            Self::Href(href) => href,
            Self::Object { href } => href,
        }
    }
}

impl RenderedLinks {
    fn resolve(&self, base_url: &Url) -> Vec<String> {
        let entries: Vec<&LinkEntry> = match self {
            Self::List(list) => list.iter().collect(),
            Self::Grouped { internal, external } => internal.iter().chain(external).collect(),
            Self::None => Vec::new(),
        };

        let mut seen = HashSet::new();
        entries
            .into_iter()
            .filter_map(|entry| resolve_link(base_url, entry.href()))
            .filter(|link| seen.insert(link.clone()))
            .collect()
    }
}

/// Renderer backed by an HTTP rendering service
pub struct RenderService {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl RenderService {
    /// Creates a client for the service at `endpoint`
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Creates a client from configuration
    ///
    /// When `api-key-env` names a variable that is not set, the service is
    /// considered not configured.
    pub fn from_config(renderer: &RendererConfig, fetcher: &FetcherConfig) -> Result<Self> {
        let api_key = match &renderer.api_key_env {
            Some(var) => match std::env::var(var) {
                Ok(key) if !key.trim().is_empty() => Some(key),
                _ => {
                    return Err(SurveyError::NotConfigured(format!(
                        "renderer API key variable {} is not set",
                        var
                    )))
                }
            },
            None => None,
        };

        let client = build_client_with_timeout(fetcher, Duration::from_secs(renderer.timeout_secs))?;
        Ok(Self::new(client, renderer.endpoint.as_str(), api_key))
    }
}

#[async_trait]
impl Renderer for RenderService {
    fn name(&self) -> &str {
        "render"
    }

    async fn render(&self, url: &str) -> Result<ParsedPage> {
        let base_url = Url::parse(url)?;
        let request = ScrapeRequest {
            url,
            formats: ["markdown", "links"],
        };

        let mut builder = self
            .client
            .post(format!("{}/scrape", self.endpoint))
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SurveyError::Fetch {
                url: url.to_string(),
                message: format!("renderer returned HTTP {}", status.as_u16()),
            });
        }

        let body: ScrapeResponse = response.json().await?;
        let data = match body.data {
            Some(data) if body.success => data,
            _ => {
                return Err(SurveyError::Fetch {
                    url: url.to_string(),
                    message: body
                        .error
                        .unwrap_or_else(|| "renderer reported failure".to_string()),
                })
            }
        };

        Ok(ParsedPage {
            title: data.metadata.title.filter(|t| !t.trim().is_empty()),
            description: data.metadata.description.filter(|d| !d.trim().is_empty()),
            markdown: data.markdown.unwrap_or_default().trim().to_string(),
            links: data.links.resolve(&base_url),
        })
    }
}
