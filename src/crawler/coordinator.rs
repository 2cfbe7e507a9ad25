//! Crawl coordinator - breadth-first same-host crawl
//!
//! This module contains the crawl loop used when a site has no usable
//! sitemap, including:
//! - Seeding the frontier from the start URL
//! - Fetching pages through a [`PageSource`]
//! - Following same-host links until the page limit is reached
//! - Producing the crawl report

use crate::crawler::fetcher::{FetchStrategy, PageSource};
use crate::crawler::scheduler::Frontier;
use crate::url::{resolve_link, SiteRoot};
use crate::{Result, SurveyError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

/// One page collected by a crawl
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawledPage {
    pub url: String,
    pub markdown: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Output of a crawl
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlReport {
    /// Normalized start URL
    pub seed: String,

    /// Number of pages collected
    pub count: usize,

    /// Strategy of the most recent successful fetch
    pub strategy: FetchStrategy,

    /// Number of URLs dequeued, including failed fetches
    pub visited: usize,

    pub pages: Vec<CrawledPage>,
}

/// Breadth-first crawler restricted to the start URL's host
#[derive(Clone)]
pub struct DomainCrawler {
    source: Arc<dyn PageSource>,
}

impl DomainCrawler {
    pub fn new(source: Arc<dyn PageSource>) -> Self {
        Self { source }
    }

    /// Crawls from `start_url` until `page_limit` pages are collected or the
    /// frontier runs dry
    ///
    /// Fetches are sequential: a page's links are enqueued before the next
    /// URL is dequeued. Failed pages are skipped and never abort the crawl.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - Pages collected, possibly none
    /// * `Err(SurveyError::NotConfigured)` - The page source has no backend
    /// * `Err(SurveyError::UrlError)` - `start_url` is not a usable URL
    pub async fn crawl(&self, start_url: &str, page_limit: usize) -> Result<CrawlReport> {
        if !self.source.has_backend() {
            return Err(SurveyError::NotConfigured(
                "no fetch backend available for crawling".to_string(),
            ));
        }

        let root = SiteRoot::parse(start_url)?;
        let seed = root.url.to_string();
        let mut frontier = Frontier::new(seed.clone(), page_limit);
        let mut pages: Vec<CrawledPage> = Vec::new();
        let mut strategy = self.source.primary_strategy();

        tracing::info!("Crawling {} (limit {} pages)", seed, page_limit);

        while pages.len() < page_limit {
            let url = match frontier.next() {
                Some(url) => url,
                None => break,
            };

            let mut page = self.source.fetch(&url).await;
            if !page.ok {
                tracing::debug!(
                    "Skipping {}: {}",
                    url,
                    page.error.as_deref().unwrap_or("fetch failed")
                );
                continue;
            }

            strategy = page.via;
            let links = std::mem::take(&mut page.links);
            pages.push(CrawledPage {
                url: page.url,
                markdown: page.markdown,
                title: page.title,
            });

            let base_url = match Url::parse(&url) {
                Ok(base_url) => base_url,
                Err(_) => continue,
            };

            let mut enqueued = 0;
            for link in links {
                let absolute = match resolve_link(&base_url, &link) {
                    Some(absolute) => absolute,
                    None => continue,
                };
                if !root.contains(&absolute) {
                    continue;
                }
                if frontier.push(absolute, pages.len()) {
                    enqueued += 1;
                }
            }
            tracing::debug!(
                "Fetched {} ({} new links, {} queued)",
                url,
                enqueued,
                frontier.len()
            );
        }

        tracing::info!(
            "Crawl of {} finished: {} pages from {} visited URLs",
            seed,
            pages.len(),
            frontier.visited_count()
        );

        Ok(CrawlReport {
            seed,
            count: pages.len(),
            strategy,
            visited: frontier.visited_count(),
            pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fetcher::PageContent;
    use crate::crawler::parser::ParsedPage;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory site: URL -> outgoing links. Unknown URLs fail.
    struct FakeSite {
        pages: HashMap<String, Vec<String>>,
        fetched: Mutex<Vec<String>>,
    }

    impl FakeSite {
        fn new(pages: &[(&str, &[&str])]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, links)| {
                        (
                            url.to_string(),
                            links.iter().map(|l| l.to_string()).collect(),
                        )
                    })
                    .collect(),
                fetched: Mutex::new(Vec::new()),
            }
        }

        fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource for FakeSite {
        async fn fetch(&self, url: &str) -> PageContent {
            self.fetched.lock().unwrap().push(url.to_string());
            match self.pages.get(url) {
                Some(links) => PageContent::from_parsed(
                    url,
                    FetchStrategy::Http,
                    ParsedPage {
                        title: Some(format!("Title of {}", url)),
                        description: None,
                        markdown: format!("Content of {}", url),
                        links: links.clone(),
                    },
                ),
                None => PageContent::failed(url, FetchStrategy::Http, "HTTP 404"),
            }
        }
    }

    struct NoBackend;

    #[async_trait]
    impl PageSource for NoBackend {
        async fn fetch(&self, url: &str) -> PageContent {
            PageContent::failed(url, FetchStrategy::None, "no fetch backend configured")
        }

        fn has_backend(&self) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_breadth_first_order() {
        let site = Arc::new(FakeSite::new(&[
            ("https://a.com/", &["/1", "/2"]),
            ("https://a.com/1", &["/3"]),
            ("https://a.com/2", &[]),
            ("https://a.com/3", &[]),
        ]));
        let crawler = DomainCrawler::new(site.clone());

        let report = crawler.crawl("a.com", 10).await.unwrap();
        assert_eq!(report.seed, "https://a.com/");
        assert_eq!(report.count, 4);
        assert_eq!(
            site.fetched(),
            vec![
                "https://a.com/",
                "https://a.com/1",
                "https://a.com/2",
                "https://a.com/3"
            ]
        );
    }

    #[tokio::test]
    async fn test_respects_page_limit() {
        let site = Arc::new(FakeSite::new(&[
            ("https://a.com/", &["/1", "/2", "/3", "/4"]),
            ("https://a.com/1", &[]),
            ("https://a.com/2", &[]),
            ("https://a.com/3", &[]),
            ("https://a.com/4", &[]),
        ]));
        let crawler = DomainCrawler::new(site.clone());

        let report = crawler.crawl("https://a.com/", 2).await.unwrap();
        assert_eq!(report.count, 2);
        assert_eq!(report.pages.len(), 2);
        assert_eq!(site.fetched().len(), 2);
    }

    #[tokio::test]
    async fn test_stays_on_host_and_never_refetches() {
        let site = Arc::new(FakeSite::new(&[
            (
                "https://a.com/",
                &[
                    "/1",
                    "https://other.com/x",
                    "https://a.com/#top",
                    "/1#section",
                    "mailto:hi@a.com",
                ],
            ),
            ("https://a.com/1", &["/", "https://blog.a.com/post"]),
            ("https://blog.a.com/post", &["https://a.com/1"]),
        ]));
        let crawler = DomainCrawler::new(site.clone());

        let report = crawler.crawl("https://a.com/", 10).await.unwrap();
        assert_eq!(report.count, 3);
        assert_eq!(
            site.fetched(),
            vec!["https://a.com/", "https://a.com/1", "https://blog.a.com/post"]
        );
    }

    #[tokio::test]
    async fn test_failed_pages_are_skipped() {
        let site = Arc::new(FakeSite::new(&[
            ("https://a.com/", &["/missing", "/ok"]),
            ("https://a.com/ok", &[]),
        ]));
        let crawler = DomainCrawler::new(site.clone());

        let report = crawler.crawl("https://a.com/", 10).await.unwrap();
        assert_eq!(report.count, 2);
        assert_eq!(report.visited, 3);
        assert_eq!(report.strategy, FetchStrategy::Http);
        assert!(report.pages.iter().all(|p| p.url != "https://a.com/missing"));
    }

    #[tokio::test]
    async fn test_no_backend_is_not_configured() {
        let crawler = DomainCrawler::new(Arc::new(NoBackend));
        let err = crawler.crawl("https://a.com/", 5).await.unwrap_err();
        assert!(err.is_not_configured());
    }
}
