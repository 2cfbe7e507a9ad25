//! Search-result page scrapers used as competitor fallbacks

use crate::{Result, SurveyError};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// One organic search result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerpHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// A web search engine queried for plain result listings
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Display name, also used in fallback descriptions
    fn name(&self) -> &str;

    async fn search(&self, query: &str) -> Result<Vec<SerpHit>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    DuckDuckGo,
    Bing,
}

impl EngineKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DuckDuckGo => "DuckDuckGo",
            Self::Bing => "Bing",
        }
    }

    fn search_path(&self) -> &'static str {
        match self {
            Self::DuckDuckGo => "/html/",
            Self::Bing => "/search",
        }
    }
}

/// Scrapes an engine's HTML result page
#[derive(Debug, Clone)]
pub struct HtmlSearchEngine {
    kind: EngineKind,
    client: Client,
    base_url: String,
}

impl HtmlSearchEngine {
    pub fn new(kind: EngineKind, client: Client, base_url: impl Into<String>) -> Self {
        Self {
            kind,
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn search_url(&self, query: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, self.kind.search_path()))?;
        url.query_pairs_mut().append_pair("q", query);
        Ok(url)
    }
}

#[async_trait]
impl SearchEngine for HtmlSearchEngine {
    fn name(&self) -> &str {
        self.kind.name()
    }

    async fn search(&self, query: &str) -> Result<Vec<SerpHit>> {
        let url = self.search_url(query)?;
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SurveyError::Fetch {
                url: url.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        let html = response.text().await?;
        match self.kind {
            EngineKind::DuckDuckGo => parse_duckduckgo(&html),
            EngineKind::Bing => parse_bing(&html),
        }
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| SurveyError::Parse {
        source_name: format!("selector '{}'", css),
        message: e.to_string(),
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn has_class(element: &ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// Unwraps DuckDuckGo redirect links (`/l/?uddg=<target>`)
fn unwrap_redirect(href: &str) -> String {
    if !href.contains("uddg=") {
        return href.to_string();
    }
    let Ok(base) = Url::parse("https://duckduckgo.com/") else {
        return href.to_string();
    };
    base.join(href)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "uddg")
                .map(|(_, target)| target.into_owned())
        })
        .unwrap_or_else(|| href.to_string())
}

/// Extracts organic results from a DuckDuckGo HTML result page
///
/// Results are `a.result__a` links; the snippet is the `.result__snippet`
/// inside the enclosing `.result__body`.
pub fn parse_duckduckgo(html: &str) -> Result<Vec<SerpHit>> {
    let document = Html::parse_document(html);
    let link_selector = selector("a.result__a")?;
    let snippet_selector = selector(".result__snippet")?;

    let mut hits = Vec::new();
    for link in document.select(&link_selector) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let url = unwrap_redirect(href.trim());
        if !url.starts_with("http") {
            continue;
        }

        let snippet = link
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|ancestor| has_class(ancestor, "result__body"))
            .and_then(|body| body.select(&snippet_selector).next())
            .map(element_text)
            .unwrap_or_default();

        hits.push(SerpHit {
            title: element_text(link),
            url,
            snippet,
        });
    }

    Ok(hits)
}

/// Extracts organic results from a Bing result page
///
/// Results are `li.b_algo h2 a` links; the snippet is the first `p` of the
/// result item.
pub fn parse_bing(html: &str) -> Result<Vec<SerpHit>> {
    let document = Html::parse_document(html);
    let link_selector = selector("li.b_algo h2 a")?;
    let snippet_selector = selector("p")?;

    let mut hits = Vec::new();
    for link in document.select(&link_selector) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let url = href.trim().to_string();
        if !url.starts_with("http") {
            continue;
        }

        let snippet = link
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|ancestor| ancestor.value().name() == "li")
            .and_then(|item| item.select(&snippet_selector).next())
            .map(element_text)
            .unwrap_or_default();

        hits.push(SerpHit {
            title: element_text(link),
            url,
            snippet,
        });
    }

    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DDG_PAGE: &str = r##"
        <div class="results">
          <div class="result results_links">
            <div class="links_main result__body">
              <h2 class="result__title">
                <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Frival.io%2Fabout&amp;rut=abc">Rival   Roasters</a>
              </h2>
              <a class="result__snippet" href="#">Fresh <b>coffee</b> daily</a>
            </div>
          </div>
          <div class="result">
            <div class="result__body">
              <a class="result__a" href="https://beans.example/">Beans</a>
            </div>
          </div>
          <a class="result__a" href="/relative">Skip me</a>
        </div>"##;

    #[test]
    fn test_parse_duckduckgo() {
        let hits = parse_duckduckgo(DDG_PAGE).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://rival.io/about");
        assert_eq!(hits[0].title, "Rival Roasters");
        assert_eq!(hits[0].snippet, "Fresh coffee daily");
        assert_eq!(hits[1].url, "https://beans.example/");
        assert_eq!(hits[1].snippet, "");
    }

    #[test]
    fn test_parse_bing() {
        let html = r#"
            <ol id="b_results">
              <li class="b_algo">
                <h2><a href="https://rival.io/">Rival</a></h2>
                <div class="b_caption"><p>Specialty coffee roasters.</p></div>
              </li>
              <li class="b_algo"><h2><a href="https://other.net/">Other</a></h2></li>
              <li class="b_ad"><h2><a href="https://ad.example/">Ad</a></h2></li>
            </ol>"#;
        let hits = parse_bing(html).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].snippet, "Specialty coffee roasters.");
        assert_eq!(hits[1].title, "Other");
        assert_eq!(hits[1].snippet, "");
    }

    #[test]
    fn test_unwrap_redirect() {
        assert_eq!(
            unwrap_redirect("https://duckduckgo.com/l/?uddg=https%3A%2F%2Fa.io%2F"),
            "https://a.io/"
        );
        assert_eq!(unwrap_redirect("https://b.io/"), "https://b.io/");
    }

    #[test]
    fn test_search_url() {
        let engine = HtmlSearchEngine::new(EngineKind::DuckDuckGo, Client::new(), "https://duckduckgo.com/");
        assert_eq!(
            engine.search_url("coffee berlin").unwrap().as_str(),
            "https://duckduckgo.com/html/?q=coffee+berlin"
        );
        let bing = HtmlSearchEngine::new(EngineKind::Bing, Client::new(), "https://www.bing.com");
        assert_eq!(
            bing.search_url("a&b").unwrap().as_str(),
            "https://www.bing.com/search?q=a%26b"
        );
    }
}
