//! Integration tests for batch auditing
//!
//! Sitemaps are served by wiremock; pages come from an in-memory source so
//! individual fetch failures can be injected.

use async_trait::async_trait;
use reqwest::Client;
use site_scout::batch::{BatchAuditRunner, HeuristicAnalyzer};
use site_scout::config::BatchConfig;
use site_scout::crawler::{FetchStrategy, PageContent, PageSource, ParsedPage};
use site_scout::discovery::SitemapResolver;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serves a fixed page for every URL except those marked as failing
struct ScriptedSource {
    failing: HashSet<String>,
    fetched: Mutex<Vec<String>>,
}

impl ScriptedSource {
    fn new(failing: &[String]) -> Self {
        Self {
            failing: failing.iter().cloned().collect(),
            fetched: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn fetch(&self, url: &str) -> PageContent {
        self.fetched.lock().unwrap().push(url.to_string());
        if self.failing.contains(url) {
            return PageContent::failed(url, FetchStrategy::Http, "connection reset");
        }
        PageContent::from_parsed(
            url,
            FetchStrategy::Http,
            ParsedPage {
                title: Some("Acme Roasters".to_string()),
                description: None,
                markdown: "# Acme Roasters\n\nSmall batch coffee.\n\n## Where are you?\n\n\
                           Visit 12 Harbor Street or call 555-867-5309."
                    .to_string(),
                links: vec![],
            },
        )
    }
}

async fn mount_sitemap(server: &MockServer, urls: &[String]) {
    let entries: String = urls
        .iter()
        .map(|u| format!("<url><loc>{}</loc></url>", u))
        .collect();
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">{}</urlset>",
            entries
        )))
        .mount(server)
        .await;
}

fn runner(source: Arc<ScriptedSource>, settings: BatchConfig) -> BatchAuditRunner {
    let analyzer = Arc::new(HeuristicAnalyzer::new().unwrap());
    BatchAuditRunner::new(
        SitemapResolver::new(Client::new()),
        source,
        analyzer.clone(),
        analyzer,
        settings,
    )
}

#[tokio::test]
async fn test_failed_page_is_isolated() {
    let server = MockServer::start().await;
    let urls: Vec<String> = (1..=3).map(|i| format!("{}/page{}", server.uri(), i)).collect();
    mount_sitemap(&server, &urls).await;

    let source = Arc::new(ScriptedSource::new(&[urls[1].clone()]));
    let result = runner(source.clone(), BatchConfig::default())
        .run(&server.uri(), 3)
        .await
        .unwrap();

    assert_eq!(result.total_discovered, 3);
    assert_eq!(result.processed, 2);
    assert_eq!(result.errors_count, 1);
    assert_eq!(result.errors, vec![format!("{}: connection reset", urls[1])]);
    assert_eq!(result.per_capability_success_counts.content_chunks, 2);
    assert_eq!(result.per_capability_success_counts.contact_data, 2);

    // Every candidate is attempted exactly once
    assert_eq!(*source.fetched.lock().unwrap(), urls);

    let sample_urls: Vec<&str> = result.samples.iter().map(|s| s.url.as_str()).collect();
    assert_eq!(sample_urls, vec![urls[0].as_str(), urls[2].as_str()]);
}

#[tokio::test]
async fn test_sample_shape() {
    let server = MockServer::start().await;
    let urls = vec![format!("{}/", server.uri())];
    mount_sitemap(&server, &urls).await;

    let source = Arc::new(ScriptedSource::new(&[]));
    let result = runner(source, BatchConfig::default())
        .run(&server.uri(), 10)
        .await
        .unwrap();

    let sample = &result.samples[0];
    assert_eq!(sample.chunks_preview.len(), 2);
    assert_eq!(sample.chunks_preview[0].question, "What is Acme Roasters?");
    let contact = sample.contact.as_ref().unwrap();
    assert_eq!(contact.name.as_deref(), Some("Acme Roasters"));
    assert_eq!(contact.phone.as_deref(), Some("555-867-5309"));
    assert_eq!(contact.address.as_deref(), Some("12 Harbor Street"));

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["perCapabilitySuccessCounts"]["contentChunks"], 1);
    assert_eq!(value["samples"][0]["chunksPreview"][1]["question"], "Where are you?");
    assert_eq!(value["errorsCount"], 0);
}

#[tokio::test]
async fn test_root_used_when_no_sitemap() {
    let server = MockServer::start().await;

    let source = Arc::new(ScriptedSource::new(&[]));
    let result = runner(source.clone(), BatchConfig::default())
        .run(&server.uri(), 5)
        .await
        .unwrap();

    let root = format!("{}/", server.uri());
    assert_eq!(result.root, root);
    assert_eq!(result.total_discovered, 1);
    assert_eq!(result.processed, 1);
    assert_eq!(*source.fetched.lock().unwrap(), vec![root]);
}

#[tokio::test]
async fn test_candidates_truncated_to_max_pages() {
    let server = MockServer::start().await;
    let urls: Vec<String> = (0..8).map(|i| format!("{}/p{}", server.uri(), i)).collect();
    mount_sitemap(&server, &urls).await;

    let source = Arc::new(ScriptedSource::new(&[]));
    let result = runner(source.clone(), BatchConfig::default())
        .run(&server.uri(), 4)
        .await
        .unwrap();

    assert_eq!(result.processed, 4);
    assert_eq!(result.samples.len(), 3);
    assert_eq!(source.fetched.lock().unwrap().len(), 4);
}

#[tokio::test]
async fn test_error_list_bounded_but_counted() {
    let server = MockServer::start().await;
    let urls: Vec<String> = (0..5).map(|i| format!("{}/broken{}", server.uri(), i)).collect();
    mount_sitemap(&server, &urls).await;

    let settings = BatchConfig {
        max_errors: 2,
        ..BatchConfig::default()
    };
    let source = Arc::new(ScriptedSource::new(&urls));
    let result = runner(source, settings).run(&server.uri(), 0).await.unwrap();

    assert_eq!(result.processed, 0);
    assert_eq!(result.errors_count, 5);
    assert_eq!(result.errors.len(), 2);
    assert!(result.errors[0].starts_with(&urls[0]));
    assert!(result.samples.is_empty());
}
