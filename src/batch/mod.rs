//! Batch page auditing
//!
//! Runs the per-page analysis capabilities across a site's discovered URLs.
//! Every page is attempted once; a failure on one page is recorded and never
//! stops the run.

mod analyzer;

pub use analyzer::{
    ChunkExtractor, ContactData, ContactExtractor, ContentChunk, HeuristicAnalyzer,
    MAX_ANSWER_WORDS,
};

use crate::config::{BatchConfig, Config};
use crate::crawler::{PageFetcher, PageSource};
use crate::discovery::SitemapResolver;
use crate::url::SiteRoot;
use crate::{Result, SurveyError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Candidate bound used when the caller passes a page limit of zero
pub const UNBOUNDED_PAGE_LIMIT: usize = 500;

/// Number of chunks carried in a sample preview
const PREVIEW_CHUNKS: usize = 2;

/// Pages for which each capability produced a result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityCounts {
    pub content_chunks: usize,
    pub contact_data: usize,
}

/// Preview of one successfully audited page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSample {
    pub url: String,
    pub chunks_preview: Vec<ContentChunk>,
    pub contact: Option<ContactData>,
}

/// Aggregate outcome of a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub root: String,
    pub total_discovered: usize,
    pub processed: usize,
    pub per_capability_success_counts: CapabilityCounts,
    /// Total number of failed pages, including those not listed in `errors`
    pub errors_count: usize,
    pub errors: Vec<String>,
    pub samples: Vec<PageSample>,
}

struct PageAudit {
    chunks: Vec<ContentChunk>,
    contact: Option<ContactData>,
}

/// Drives chunk and contact extraction over a site's pages
#[derive(Clone)]
pub struct BatchAuditRunner {
    sitemap: SitemapResolver,
    source: Arc<dyn PageSource>,
    chunks: Arc<dyn ChunkExtractor>,
    contacts: Arc<dyn ContactExtractor>,
    settings: BatchConfig,
}

impl BatchAuditRunner {
    pub fn new(
        sitemap: SitemapResolver,
        source: Arc<dyn PageSource>,
        chunks: Arc<dyn ChunkExtractor>,
        contacts: Arc<dyn ContactExtractor>,
        settings: BatchConfig,
    ) -> Self {
        Self {
            sitemap,
            source,
            chunks,
            contacts,
            settings,
        }
    }

    /// Builds a runner with a [`PageFetcher`] and the bundled [`HeuristicAnalyzer`]
    pub fn from_config(config: &Config) -> Result<Self> {
        let analyzer = Arc::new(HeuristicAnalyzer::new()?);
        Ok(Self::new(
            SitemapResolver::from_config(config)?,
            Arc::new(PageFetcher::from_config(config)?),
            analyzer.clone(),
            analyzer,
            config.batch.clone(),
        ))
    }

    /// Audits up to `max_pages` pages of the site at `root_url`
    ///
    /// Candidates come from the sitemap; when it has none, the root URL alone
    /// is audited. A `max_pages` of zero audits up to
    /// [`UNBOUNDED_PAGE_LIMIT`] pages.
    ///
    /// # Returns
    ///
    /// * `Ok(BatchResult)` - The aggregate, even when every page failed
    /// * `Err(SurveyError)` - `root_url` is not a usable URL
    pub async fn run(&self, root_url: &str, max_pages: usize) -> Result<BatchResult> {
        let root = SiteRoot::parse(root_url)?;
        let root_url = root.url.to_string();
        let page_limit = if max_pages == 0 {
            UNBOUNDED_PAGE_LIMIT
        } else {
            max_pages
        };

        let mut candidates = self.sitemap.resolve_urls(&root_url, page_limit).await;
        if candidates.is_empty() {
            tracing::info!("No sitemap URLs for {}, auditing the root page only", root.host);
            candidates.push(root_url.clone());
        }
        let total_discovered = candidates.len();
        candidates.truncate(page_limit);

        tracing::info!("Auditing {} pages of {}", candidates.len(), root.host);

        let mut result = BatchResult {
            root: root_url,
            total_discovered,
            processed: 0,
            per_capability_success_counts: CapabilityCounts::default(),
            errors_count: 0,
            errors: Vec::new(),
            samples: Vec::new(),
        };

        for url in &candidates {
            match self.audit_page(url).await {
                Ok(audit) => {
                    result.processed += 1;
                    if !audit.chunks.is_empty() {
                        result.per_capability_success_counts.content_chunks += 1;
                    }
                    if audit.contact.is_some() {
                        result.per_capability_success_counts.contact_data += 1;
                    }
                    if result.samples.len() < self.settings.max_samples {
                        result.samples.push(PageSample {
                            url: url.clone(),
                            chunks_preview: audit.chunks.into_iter().take(PREVIEW_CHUNKS).collect(),
                            contact: audit.contact,
                        });
                    }
                }
                Err(e) => {
                    let message = match e {
                        SurveyError::Fetch { message, .. } => message,
                        other => other.to_string(),
                    };
                    tracing::debug!("Audit failed for {}: {}", url, message);
                    result.errors_count += 1;
                    if result.errors.len() < self.settings.max_errors {
                        result.errors.push(format!("{}: {}", url, message));
                    }
                }
            }
        }

        tracing::info!(
            "Batch audit of {} finished: {} processed, {} errors",
            root.host,
            result.processed,
            result.errors_count
        );

        Ok(result)
    }

    async fn audit_page(&self, url: &str) -> Result<PageAudit> {
        let page = self.source.fetch(url).await;
        if !page.ok {
            return Err(SurveyError::Fetch {
                url: url.to_string(),
                message: page.error.unwrap_or_else(|| "fetch failed".to_string()),
            });
        }

        let chunks = self
            .chunks
            .extract_chunks(&page, self.settings.max_chunks)
            .await?;
        let contact = self.contacts.extract_contact(&page).await?;

        Ok(PageAudit { chunks, contact })
    }
}
