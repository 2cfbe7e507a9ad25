//! Competitor discovery
//!
//! This module provides an ordered fallback chain:
//! 1. A grounded AI-search collaborator
//! 2. DuckDuckGo HTML results
//! 3. Bing HTML results
//!
//! The first source that yields at least one competitor wins.

mod grounded;
mod serp;

pub use grounded::{GeminiGroundedSearch, GroundedSearch};
pub use serp::{parse_bing, parse_duckduckgo, EngineKind, HtmlSearchEngine, SearchEngine, SerpHit};

use crate::config::Config;
use crate::crawler::build_client_with_timeout;
use crate::url::{ensure_scheme, host_of, hosts_overlap};
use crate::{Result, SurveyError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Result cap used when the caller passes zero
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Relevance label attached to search-result fallbacks
pub const SERP_RELEVANCE: &str = "SERP fallback";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competitor {
    pub name: String,
    pub url: String,
    pub description: String,
    pub relevance: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorResult {
    pub competitors: Vec<Competitor>,
    pub search_queries: Vec<String>,
    pub citations: Vec<Citation>,
}

/// Ordered fallback across a grounded search and search-result scrapers
#[derive(Clone)]
pub struct CompetitorChain {
    grounded: Option<Arc<dyn GroundedSearch>>,
    engines: Vec<Arc<dyn SearchEngine>>,
}

impl CompetitorChain {
    pub fn new(
        grounded: Option<Arc<dyn GroundedSearch>>,
        engines: Vec<Arc<dyn SearchEngine>>,
    ) -> Self {
        Self { grounded, engines }
    }

    /// Builds the Gemini collaborator plus DuckDuckGo and Bing fallbacks
    pub fn from_config(config: &Config) -> Result<Self> {
        let grounded = GeminiGroundedSearch::from_config(&config.grounded, &config.fetcher)?;
        let client = build_client_with_timeout(
            &config.fetcher,
            Duration::from_secs(config.competitors.search_timeout_secs),
        )?;

        let engines: Vec<Arc<dyn SearchEngine>> = vec![
            Arc::new(HtmlSearchEngine::new(
                EngineKind::DuckDuckGo,
                client.clone(),
                config.competitors.duckduckgo_url.as_str(),
            )),
            Arc::new(HtmlSearchEngine::new(
                EngineKind::Bing,
                client,
                config.competitors.bing_url.as_str(),
            )),
        ];

        Ok(Self::new(Some(Arc::new(grounded)), engines))
    }

    /// Finds up to `max_results` competitors of `domain`
    ///
    /// `query` is the search context; a blank query searches for the domain
    /// itself. Search-result hits on the target's own host (or a host it is
    /// a subdomain of) are dropped. A `max_results` of zero means
    /// [`DEFAULT_MAX_RESULTS`].
    ///
    /// # Returns
    ///
    /// * `Ok(CompetitorResult)` - Possibly without competitors when every
    ///   source came up dry; the grounded search queries and citations are
    ///   kept in that case
    /// * `Err(SurveyError::NotConfigured)` - The grounded search is not
    ///   configured and there are no fallback engines to try
    pub async fn find_competitors(
        &self,
        domain: &str,
        query: &str,
        max_results: usize,
    ) -> Result<CompetitorResult> {
        let cap = if max_results == 0 {
            DEFAULT_MAX_RESULTS
        } else {
            max_results
        };
        let domain = domain.trim();
        let search_query = match query.trim() {
            "" => domain,
            q => q,
        };
        let target_host =
            host_of(&ensure_scheme(domain)).unwrap_or_else(|| domain.to_ascii_lowercase());

        // Grounding metadata of an empty grounded answer, returned if nothing else is found
        let mut dry_result = CompetitorResult::default();

        match &self.grounded {
            Some(grounded) => match grounded.search(domain, search_query, cap).await {
                Ok(mut result) if !result.competitors.is_empty() => {
                    result.competitors.truncate(cap);
                    tracing::info!(
                        "Grounded search found {} competitors for {}",
                        result.competitors.len(),
                        domain
                    );
                    return Ok(result);
                }
                Ok(result) => {
                    tracing::info!("Grounded search found no competitors for {}", domain);
                    dry_result = result;
                }
                Err(e) if e.is_not_configured() && self.engines.is_empty() => return Err(e),
                Err(e) => tracing::warn!("Grounded search unavailable: {}", e),
            },
            None if self.engines.is_empty() => {
                return Err(SurveyError::NotConfigured(
                    "no competitor search backend configured".to_string(),
                ));
            }
            None => {}
        }

        for engine in &self.engines {
            let hits = match engine.search(search_query).await {
                Ok(hits) => hits,
                Err(e) => {
                    tracing::warn!("{} search failed: {}", engine.name(), e);
                    continue;
                }
            };

            let competitors = competitors_from_hits(hits, &target_host, engine.name(), cap);
            if !competitors.is_empty() {
                tracing::info!(
                    "{} fallback found {} competitors for {}",
                    engine.name(),
                    competitors.len(),
                    domain
                );
                return Ok(CompetitorResult {
                    competitors,
                    search_queries: vec![search_query.to_string()],
                    citations: Vec::new(),
                });
            }
        }

        tracing::info!("No competitors found for {}", domain);
        Ok(dry_result)
    }
}

/// Turns search hits into fallback competitors, skipping the target's own hosts
fn competitors_from_hits(
    hits: Vec<SerpHit>,
    target_host: &str,
    engine: &str,
    cap: usize,
) -> Vec<Competitor> {
    let mut seen = HashSet::new();
    let mut competitors = Vec::new();

    for hit in hits {
        if competitors.len() >= cap {
            break;
        }
        if !hit.url.starts_with("http") {
            continue;
        }
        let host = host_of(&hit.url).unwrap_or_default();
        if !host.is_empty() && hosts_overlap(&host, target_host) {
            continue;
        }
        if !seen.insert(hit.url.clone()) {
            continue;
        }

        let name = if hit.title.is_empty() { host } else { hit.title };
        let description = if hit.snippet.is_empty() {
            format!("{} search result", engine)
        } else {
            hit.snippet
        };
        competitors.push(Competitor {
            name,
            url: hit.url,
            description,
            relevance: SERP_RELEVANCE.to_string(),
        });
    }

    competitors
}
