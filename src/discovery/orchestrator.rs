//! Discovery orchestration: sitemap first, crawl second

use crate::config::Config;
use crate::crawler::{DomainCrawler, PageFetcher, PageSource};
use crate::discovery::walker::{collect_urls, RawNode};
use crate::discovery::{DiscoveryResult, DiscoverySource, Lookup, SitemapResolver};
use crate::url::SiteRoot;
use crate::Result;
use std::sync::Arc;

/// Produces a single discovery result from the best available source
#[derive(Clone)]
pub struct SiteDiscovery {
    sitemap: SitemapResolver,
    crawler: DomainCrawler,
    crawl_hard_cap: usize,
}

impl SiteDiscovery {
    pub fn new(sitemap: SitemapResolver, crawler: DomainCrawler, crawl_hard_cap: usize) -> Self {
        Self {
            sitemap,
            crawler,
            crawl_hard_cap,
        }
    }

    /// Builds the sitemap resolver and a crawler over a [`PageFetcher`]
    pub fn from_config(config: &Config) -> Result<Self> {
        let source: Arc<dyn PageSource> = Arc::new(PageFetcher::from_config(config)?);
        Self::with_source(config, source)
    }

    /// Like [`from_config`](Self::from_config) with a caller-supplied page source
    pub fn with_source(config: &Config, source: Arc<dyn PageSource>) -> Result<Self> {
        Ok(Self::new(
            SitemapResolver::from_config(config)?,
            DomainCrawler::new(source),
            config.discovery.crawl_hard_cap,
        ))
    }

    /// Discovers up to `max_urls` same-site URLs for `url`
    ///
    /// The sitemap is tried first. When it yields nothing, the site is
    /// crawled with a page limit of `min(max_urls, crawl_hard_cap)` and the
    /// URLs are pulled out of the crawl report.
    ///
    /// # Returns
    ///
    /// * `Ok(DiscoveryResult)` - Always produced when a crawl backend exists,
    ///   possibly with no URLs
    /// * `Err(SurveyError::NotConfigured)` - No sitemap URLs and no fetch
    ///   backend to crawl with
    pub async fn discover(&self, url: &str, max_urls: usize) -> Result<DiscoveryResult> {
        let root = SiteRoot::parse(url)?;
        let root_url = root.url.to_string();

        match self.sitemap.resolve(&root_url, max_urls).await {
            Lookup::Found(urls) => {
                return Ok(DiscoveryResult {
                    root: root_url,
                    count: urls.len(),
                    urls,
                    source: DiscoverySource::Sitemap,
                });
            }
            Lookup::Empty => {
                tracing::info!("No sitemap URLs for {}, falling back to crawl", root.host);
            }
            Lookup::Failed(reason) => {
                tracing::warn!("Sitemap unusable for {} ({}), falling back to crawl", root.host, reason);
            }
        }

        let page_limit = max_urls.min(self.crawl_hard_cap);
        let report = self.crawler.crawl(&root_url, page_limit).await?;

        let node = RawNode::from(serde_json::to_value(&report)?);
        let urls = collect_urls(&node, &root.host, max_urls);

        let count = if urls.is_empty() {
            report.count
        } else {
            urls.len()
        };

        Ok(DiscoveryResult {
            root: root_url,
            count,
            urls,
            source: DiscoverySource::Crawl,
        })
    }
}
